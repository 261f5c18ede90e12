//! Elementwise activation functions applied at the tail of dense,
//! convolutional and recurrent layers.

use crate::error::NnError;
use crate::tensor::Tensor;
use ndarray::{Axis, Dimension};
use std::fmt;
use std::str::FromStr;

/// Closed set of supported nonlinearities.
///
/// Names are resolved once, when a layer is built. An unknown name is a
/// configuration error; it never falls back to [`Activation::Linear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// Identity.
    #[default]
    Linear,
    /// `max(0, x)`.
    Relu,
    /// `1 / (1 + e^-x)`.
    Sigmoid,
    Tanh,
    /// Normalized exponential over the last axis.
    Softmax,
}

impl Activation {
    pub fn name(&self) -> &'static str {
        match self {
            Activation::Linear => "linear",
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Softmax => "softmax",
        }
    }

    /// Applies the activation, consuming the pre-activation tensor.
    ///
    /// Softmax normalizes each lane along the last axis: the whole vector for
    /// rank-1 inputs, the channel vector of every pixel for rank-3 inputs.
    pub fn apply<D: Dimension>(&self, input: Tensor<D>) -> Tensor<D> {
        match self {
            Activation::Linear => input,
            Activation::Relu => input.map(|x| x.max(0.0)),
            Activation::Sigmoid => input.map(|x| 1.0 / (1.0 + (-x).exp())),
            Activation::Tanh => input.map(f32::tanh),
            Activation::Softmax => softmax(input),
        }
    }
}

fn softmax<D: Dimension>(input: Tensor<D>) -> Tensor<D> {
    let mut data = input.into_array();
    let last = Axis(data.ndim() - 1);
    for mut lane in data.lanes_mut(last) {
        let max = lane.iter().fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        lane.mapv_inplace(|x| (x - max).exp());
        let sum = lane.sum();
        lane.mapv_inplace(|x| x / sum);
    }
    Tensor::wrap(data)
}

impl FromStr for Activation {
    type Err = NnError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" | "identity" | "none" => Ok(Activation::Linear),
            "relu" => Ok(Activation::Relu),
            "sigmoid" => Ok(Activation::Sigmoid),
            "tanh" => Ok(Activation::Tanh),
            "softmax" => Ok(Activation::Softmax),
            other => Err(NnError::config(format!(
                "unknown activation '{}' (expected one of linear, relu, sigmoid, tanh, softmax)",
                other
            ))),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
