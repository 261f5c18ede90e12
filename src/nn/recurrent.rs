//! Fully connected recurrent layer.
//!
//! The layer itself is immutable; the hidden state it threads between steps
//! lives in a separate [`RecurrentState`] owned by whoever drives the
//! sequence. Two independent sequences over the same layer simply use two
//! states.

use crate::error::{NnError, Result};
use crate::nn::activations::Activation;
use crate::tensor::{Tensor1D, Tensor2D};
use tracing::trace;

/// Hidden state of one [`SimpleRnn`], initially all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrentState {
    hidden: Tensor1D,
}

impl RecurrentState {
    pub fn zeros(units: usize) -> Self {
        Self {
            hidden: Tensor1D::zeros(units),
        }
    }

    /// Forgets the sequence seen so far.
    pub fn reset(&mut self) {
        self.hidden = Tensor1D::zeros(self.hidden.len());
    }

    pub fn units(&self) -> usize {
        self.hidden.len()
    }

    pub fn hidden(&self) -> &Tensor1D {
        &self.hidden
    }
}

/// Elman recurrent layer:
/// `state ← activation(state · weight_hidden + x · weight_input + bias)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleRnn {
    units: usize,
    activation: Activation,
    /// `[units, units]`.
    weight_hidden: Tensor2D,
    /// `[input_dim, units]`.
    weight_input: Tensor2D,
    /// `[units]`.
    bias: Tensor1D,
}

impl SimpleRnn {
    pub const KIND: &'static str = "SimpleRNN";

    pub fn new(
        units: usize,
        activation: Activation,
        weight_hidden: Tensor2D,
        weight_input: Tensor2D,
        bias: Tensor1D,
    ) -> Result<Self> {
        if units == 0 {
            return Err(NnError::config("SimpleRNN needs at least one unit"));
        }
        if weight_hidden.shape() != [units, units] {
            return Err(NnError::InvalidParameter {
                layer: Self::KIND,
                parameter: "weight_hidden",
                expected: vec![units, units],
                actual: weight_hidden.shape().to_vec(),
            });
        }
        if weight_input.cols() != units {
            return Err(NnError::InvalidParameter {
                layer: Self::KIND,
                parameter: "weight_input",
                expected: vec![weight_input.rows(), units],
                actual: weight_input.shape().to_vec(),
            });
        }
        if bias.shape() != [units] {
            return Err(NnError::InvalidParameter {
                layer: Self::KIND,
                parameter: "bias",
                expected: vec![units],
                actual: bias.shape().to_vec(),
            });
        }
        Ok(Self {
            units,
            activation,
            weight_hidden,
            weight_input,
            bias,
        })
    }

    pub fn units(&self) -> usize {
        self.units
    }

    /// Length of the vectors fed to each step.
    pub fn input_dim(&self) -> usize {
        self.weight_input.rows()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Zero state sized for this layer.
    pub fn initial_state(&self) -> RecurrentState {
        RecurrentState::zeros(self.units)
    }

    pub fn parameter_count(&self) -> usize {
        self.weight_hidden.len() + self.weight_input.len() + self.bias.len()
    }

    /// Runs one step: updates `state` and returns the new hidden vector.
    ///
    /// On error the state is left untouched.
    pub fn forward(&self, state: &mut RecurrentState, input: &Tensor1D) -> Result<Tensor1D> {
        if input.len() != self.input_dim() {
            return Err(NnError::shape(
                Self::KIND,
                format!("input of length {}", self.input_dim()),
                format!("input of length {}", input.len()),
            ));
        }
        if state.units() != self.units {
            return Err(NnError::shape(
                format!("{} state", Self::KIND),
                format!("{} units", self.units),
                format!("{} units", state.units()),
            ));
        }

        let from_hidden = state.hidden.matmul(&self.weight_hidden)?;
        let from_input = input.matmul(&self.weight_input)?;
        let pre_activation = from_hidden.add(&from_input)?.add(&self.bias)?;
        let next = self.activation.apply(pre_activation);
        trace!(units = self.units, "recurrent step");

        state.hidden = next.clone();
        Ok(next)
    }
}
