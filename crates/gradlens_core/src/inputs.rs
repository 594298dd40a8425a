//! Snapshot of a model invocation's arguments.

use std::collections::HashMap;

use burn::prelude::*;

/// Immutable snapshot of the positional and named arguments of one model
/// call.
///
/// Threaded through DoI and QoI strategies so they can reach beyond the
/// immediate cut value (e.g. a DoI that substitutes an upstream value for
/// the cut's own activation). Strategies that only need the cut value
/// ignore it.
#[derive(Debug, Clone)]
pub struct ModelInputs<B: Backend> {
    args: Vec<Tensor<B, 2>>,
    kwargs: HashMap<String, Tensor<B, 2>>,
}

impl<B: Backend> ModelInputs<B> {
    /// Snapshot the given positional arguments.
    #[must_use]
    pub fn new(args: Vec<Tensor<B, 2>>) -> Self {
        Self {
            args,
            kwargs: HashMap::new(),
        }
    }

    /// Add a named argument.
    #[must_use]
    pub fn with_kwarg(mut self, name: impl Into<String>, value: Tensor<B, 2>) -> Self {
        self.kwargs.insert(name.into(), value);
        self
    }

    /// Positional argument at `index`, if present.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Tensor<B, 2>> {
        self.args.get(index)
    }

    /// Named argument called `name`, if present.
    #[must_use]
    pub fn kwarg(&self, name: &str) -> Option<&Tensor<B, 2>> {
        self.kwargs.get(name)
    }

    /// The first positional argument, if present.
    #[must_use]
    pub fn first(&self) -> Option<&Tensor<B, 2>> {
        self.args.first()
    }

    /// All positional arguments.
    #[must_use]
    pub fn args(&self) -> &[Tensor<B, 2>] {
        &self.args
    }

    /// Number of positional arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether there are no positional arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl<B: Backend> From<Tensor<B, 2>> for ModelInputs<B> {
    fn from(value: Tensor<B, 2>) -> Self {
        Self::new(vec![value])
    }
}

impl<B: Backend> From<Vec<Tensor<B, 2>>> for ModelInputs<B> {
    fn from(args: Vec<Tensor<B, 2>>) -> Self {
        Self::new(args)
    }
}
