//! Fully connected layer.

use crate::error::{NnError, Result};
use crate::nn::activations::Activation;
use crate::nn::module::Module;
use crate::tensor::{Tensor1D, Tensor2D};

/// Dense layer: `output[j] = activation(bias[j] + Σ_i input[i] * weight[i][j])`.
///
/// # Example
///
/// ```rust
/// use seqnet::nn::{Activation, Dense, Module};
/// use seqnet::tensor::{Tensor1D, Tensor2D};
///
/// let weight = Tensor2D::new(&[2, 2], vec![1.0, 0.0, 0.0, 1.0]).unwrap();
/// let bias = Tensor1D::from_vec(vec![1.0, 1.0]).unwrap();
/// let dense = Dense::new(2, 2, Activation::Linear, weight, Some(bias)).unwrap();
///
/// let x = Tensor1D::from_vec(vec![1.0, 2.0]).unwrap();
/// assert_eq!(dense.forward(&x).unwrap().to_vec(), vec![2.0, 3.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    input_dim: usize,
    out_dim: usize,
    activation: Activation,
    /// `[input_dim, out_dim]`.
    weight: Tensor2D,
    /// `[out_dim]`, absent when the layer was configured without bias.
    bias: Option<Tensor1D>,
}

impl Dense {
    /// Creates a dense layer, checking the parameter shapes against the
    /// declared dimensions.
    pub fn new(
        input_dim: usize,
        out_dim: usize,
        activation: Activation,
        weight: Tensor2D,
        bias: Option<Tensor1D>,
    ) -> Result<Self> {
        if input_dim == 0 || out_dim == 0 {
            return Err(NnError::config(format!(
                "Dense dimensions must be positive, got {}x{}",
                input_dim, out_dim
            )));
        }
        if weight.shape() != [input_dim, out_dim] {
            return Err(NnError::InvalidParameter {
                layer: Self::KIND,
                parameter: "weight",
                expected: vec![input_dim, out_dim],
                actual: weight.shape().to_vec(),
            });
        }
        if let Some(bias) = &bias {
            if bias.shape() != [out_dim] {
                return Err(NnError::InvalidParameter {
                    layer: Self::KIND,
                    parameter: "bias",
                    expected: vec![out_dim],
                    actual: bias.shape().to_vec(),
                });
            }
        }
        Ok(Self {
            input_dim,
            out_dim,
            activation,
            weight,
            bias,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn has_bias(&self) -> bool {
        self.bias.is_some()
    }
}

impl Module for Dense {
    type Input = Tensor1D;
    type Output = Tensor1D;

    const KIND: &'static str = "Dense";

    fn forward(&self, input: &Tensor1D) -> Result<Tensor1D> {
        if input.len() != self.input_dim {
            return Err(NnError::shape(
                Self::KIND,
                format!("input of length {}", self.input_dim),
                format!("input of length {}", input.len()),
            ));
        }
        let product = input.matmul(&self.weight)?;
        let pre_activation = match &self.bias {
            Some(bias) => product.add(bias)?,
            None => product,
        };
        Ok(self.activation.apply(pre_activation))
    }

    fn parameter_count(&self) -> usize {
        self.weight.len() + self.bias.as_ref().map_or(0, Tensor1D::len)
    }
}
