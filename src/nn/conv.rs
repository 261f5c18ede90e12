// --- File: src/nn/conv.rs ---

//! Module implementing the 2D convolution layer for HWC images.

use crate::error::{NnError, Result};
use crate::nn::activations::Activation;
use crate::nn::module::Module;
use crate::nn::padding::{Padding, WindowGeometry};
use crate::tensor::{Tensor1D, Tensor3D, Tensor4D};
use ndarray::Array3;

/// Hyperparameters of a [`Conv2D`] layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Conv2DConfig {
    /// Number of output channels.
    pub filters: usize,
    /// Kernel size (kh, kw).
    pub size: [usize; 2],
    /// Stride (sy, sx).
    pub stride: [usize; 2],
    pub padding: Padding,
    pub activation: Activation,
}

impl Conv2DConfig {
    /// Stride 1, `valid` padding and linear activation.
    pub fn new(filters: usize, size: [usize; 2]) -> Self {
        Self {
            filters,
            size,
            stride: [1, 1],
            padding: Padding::Valid,
            activation: Activation::Linear,
        }
    }

    pub fn with_stride(mut self, stride: [usize; 2]) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }
}

/// 2D convolution over an `[h, w, c]` image.
///
/// `output[y][x][f] = activation(bias[f] + Σ input[y*sy+dy][x*sx+dx][c] * weight[dy][dx][c][f])`
/// where the input coordinates are shifted by the leading pad in `same` mode
/// and positions inside the padding contribute zero.
///
/// # Example
///
/// ```rust,ignore
/// let config = Conv2DConfig::new(8, [3, 3]).with_padding(Padding::Same);
/// let conv = Conv2D::new(config, weight, bias)?; // weight: [3, 3, c, 8]
/// let features = conv.forward(&image)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Conv2D {
    config: Conv2DConfig,
    /// `[kh, kw, in_channels, filters]`.
    weight: Tensor4D,
    /// `[filters]`.
    bias: Tensor1D,
}

impl Conv2D {
    pub fn new(config: Conv2DConfig, weight: Tensor4D, bias: Tensor1D) -> Result<Self> {
        if config.filters == 0 {
            return Err(NnError::config("Conv2D needs at least one filter"));
        }
        if config.size.contains(&0) || config.stride.contains(&0) {
            return Err(NnError::config(format!(
                "Conv2D size {:?} and stride {:?} must be positive",
                config.size, config.stride
            )));
        }
        let (kh, kw, channels, filters) = weight.dims();
        if [kh, kw] != config.size || filters != config.filters {
            return Err(NnError::InvalidParameter {
                layer: Self::KIND,
                parameter: "weight",
                expected: vec![config.size[0], config.size[1], channels, config.filters],
                actual: weight.shape().to_vec(),
            });
        }
        if bias.shape() != [config.filters] {
            return Err(NnError::InvalidParameter {
                layer: Self::KIND,
                parameter: "bias",
                expected: vec![config.filters],
                actual: bias.shape().to_vec(),
            });
        }
        Ok(Self { config, weight, bias })
    }

    pub fn config(&self) -> &Conv2DConfig {
        &self.config
    }

    /// Channel count the kernel expects from its input.
    pub fn in_channels(&self) -> usize {
        self.weight.dims().2
    }

    /// Window placement for an input of `(height, width)`.
    pub fn geometry(&self, input: (usize, usize)) -> Result<WindowGeometry> {
        WindowGeometry::new(
            self.config.padding,
            input,
            self.config.size,
            self.config.stride,
            Self::KIND,
        )
    }
}

impl Module for Conv2D {
    type Input = Tensor3D;
    type Output = Tensor3D;

    const KIND: &'static str = "Conv2D";

    fn forward(&self, input: &Tensor3D) -> Result<Tensor3D> {
        let (in_h, in_w, in_c) = input.dims();
        let (kh, kw, channels, filters) = self.weight.dims();
        if in_c != channels {
            return Err(NnError::shape(
                Self::KIND,
                format!("{} input channels", channels),
                format!("{} input channels", in_c),
            ));
        }

        let geometry = self.geometry((in_h, in_w))?;
        let (out_h, out_w) = geometry.output();
        let stride = self.config.stride;
        let x = input.array();
        let w = self.weight.array();

        let mut output = Array3::<f32>::zeros((out_h, out_w, filters));
        for oy in 0..out_h {
            for ox in 0..out_w {
                for dy in 0..kh {
                    for dx in 0..kw {
                        let Some((iy, ix)) = geometry.source((oy, ox), (dy, dx), stride, (in_h, in_w)) else {
                            continue;
                        };
                        for c in 0..channels {
                            let value = x[[iy, ix, c]];
                            for f in 0..filters {
                                output[[oy, ox, f]] += value * w[[dy, dx, c, f]];
                            }
                        }
                    }
                }
            }
        }

        let pre_activation = Tensor3D::wrap(output).add_bias(&self.bias)?;
        Ok(self.config.activation.apply(pre_activation))
    }

    fn parameter_count(&self) -> usize {
        self.weight.len() + self.bias.len()
    }
}
