//! Module defining the core `Module` trait for stateless layers.

use crate::error::Result;

/// Common interface of every stateless layer.
///
/// A `Module` maps one input to one freshly allocated output and never
/// mutates itself. The recurrent layer keeps its hidden state outside the
/// layer and therefore exposes its own step function instead.
pub trait Module {
    type Input;
    type Output;

    /// Layer kind, used in error contexts and traces.
    const KIND: &'static str;

    /// Runs the layer on `input`.
    fn forward(&self, input: &Self::Input) -> Result<Self::Output>;

    /// Number of scalar parameters held by the layer.
    fn parameter_count(&self) -> usize {
        0
    }
}
