//! Cut and slice addressing.
//!
//! A [`Cut`] names a tensor-producing point in a model's computation graph.
//! A [`Slice`] is the ordered pair of cuts an attribution is computed over.
//! Both are pure request descriptors: they perform no computation and are
//! only resolved against a concrete model invocation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side of a layer a cut observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Anchor {
    /// The value flowing into the layer.
    In,
    /// The value the layer produces.
    Out,
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::Out => write!(f, "out"),
        }
    }
}

/// Identifier of a layer within a model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerId {
    /// Layer addressed by position in the model's execution order.
    Index(usize),
    /// Layer addressed by name.
    Name(String),
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<usize> for LayerId {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for LayerId {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// A named point in a model's computation graph.
///
/// Cuts are immutable keys the [`Model`](crate::Model) capability resolves
/// against its own topology; equality and hashing are by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cut {
    /// The model's input.
    Input,
    /// The model's output.
    Output,
    /// A specific layer, anchored to its input or output side.
    Layer {
        /// Which layer.
        id: LayerId,
        /// Which side of the layer.
        anchor: Anchor,
    },
}

impl Cut {
    /// Cut at the model's input.
    #[must_use]
    pub const fn input() -> Self {
        Self::Input
    }

    /// Cut at the model's output.
    #[must_use]
    pub const fn output() -> Self {
        Self::Output
    }

    /// Cut at a layer with an explicit anchor.
    pub fn layer(id: impl Into<LayerId>, anchor: Anchor) -> Self {
        Self::Layer {
            id: id.into(),
            anchor,
        }
    }

    /// Cut at the output of the layer at `index`.
    #[must_use]
    pub const fn index(index: usize) -> Self {
        Self::Layer {
            id: LayerId::Index(index),
            anchor: Anchor::Out,
        }
    }

    /// Cut at the output of the layer called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Layer {
            id: LayerId::Name(name.into()),
            anchor: Anchor::Out,
        }
    }
}

impl fmt::Display for Cut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
            Self::Layer { id, anchor } => write!(f, "layer {id} ({anchor})"),
        }
    }
}

/// An ordered pair of cuts bounding the subgraph an attribution covers.
///
/// The destination cut must be reachable from the source cut in the model's
/// execution order; that invariant is enforced by the model capability when
/// the slice is first used, not at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slice {
    from: Cut,
    to: Cut,
}

impl Slice {
    /// Create a slice from `from` to `to`.
    #[must_use]
    pub const fn new(from: Cut, to: Cut) -> Self {
        Self { from, to }
    }

    /// Slice spanning the whole model, input to output.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            from: Cut::Input,
            to: Cut::Output,
        }
    }

    /// The source cut.
    #[must_use]
    pub const fn from_cut(&self) -> &Cut {
        &self.from
    }

    /// The destination cut.
    #[must_use]
    pub const fn to_cut(&self) -> &Cut {
        &self.to
    }
}

impl From<(Cut, Cut)> for Slice {
    fn from((from, to): (Cut, Cut)) -> Self {
        Self::new(from, to)
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}
