//! Model topology configuration.
//!
//! A [`ModelConfig`] lists layer descriptors with their hyperparameters only.
//! The parameter tensors are supplied separately, already materialized, in a
//! [`ParameterStore`] keyed by `"{position}.{name}"`:
//!
//! | layer        | keys                                            |
//! |--------------|-------------------------------------------------|
//! | `Dense`      | `weight`, `bias` (when `use_bias`)              |
//! | `Conv2D`     | `weight`, `bias`                                |
//! | `Embedding`  | `weight`                                        |
//! | `SimpleRNN`  | `weight_hidden`, `weight_input`, `bias`         |
//!
//! Activation and padding names are resolved here, so a typo fails when the
//! model is built.
//!
//! ```rust
//! use seqnet::config::{ModelConfig, ParameterStore};
//! use ndarray::{arr1, arr2};
//!
//! let config = ModelConfig::from_json(r#"{
//!     "layers": [
//!         { "class_name": "Dense", "input_dim": 2, "units": 1, "activation": "relu" }
//!     ]
//! }"#).unwrap();
//!
//! let params = ParameterStore::new()
//!     .with("0.weight", arr2(&[[1.0f32], [1.0]]).into_dyn())
//!     .with("0.bias", arr1(&[0.5f32]).into_dyn());
//!
//! let model = config.build(&params).unwrap();
//! assert_eq!(model.len(), 1);
//! ```

use crate::error::{NnError, Result};
use crate::nn::{
    Activation, Conv2D, Conv2DConfig, Dense, Embedding, Flatten, Layer, MaxPooling2D, Module,
    Padding, Rescale, SimpleRnn,
};
use crate::nn::padding::window_pair;
use crate::runtime::Model;
use crate::tensor::Tensor;
use ndarray::{ArrayD, Dimension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

fn default_activation() -> String {
    "linear".to_string()
}

fn default_rnn_activation() -> String {
    "tanh".to_string()
}

fn default_padding() -> String {
    "valid".to_string()
}

fn default_true() -> bool {
    true
}

fn default_scale() -> f32 {
    1.0
}

/// Hyperparameters of one layer, tagged by `class_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class_name")]
pub enum LayerConfig {
    Rescaling {
        #[serde(default = "default_scale")]
        scale: f32,
        #[serde(default)]
        offset: f32,
    },
    Flatten,
    Dense {
        input_dim: usize,
        units: usize,
        #[serde(default = "default_activation")]
        activation: String,
        #[serde(default = "default_true")]
        use_bias: bool,
    },
    MaxPooling2D {
        pool_size: Vec<usize>,
        /// Defaults to `pool_size`.
        #[serde(default)]
        strides: Option<Vec<usize>>,
        #[serde(default = "default_padding")]
        padding: String,
    },
    Conv2D {
        filters: usize,
        kernel_size: Vec<usize>,
        #[serde(default)]
        strides: Option<Vec<usize>>,
        #[serde(default = "default_padding")]
        padding: String,
        #[serde(default = "default_activation")]
        activation: String,
    },
    Embedding {
        input_dim: usize,
        output_dim: usize,
    },
    #[serde(rename = "SimpleRNN")]
    SimpleRnn {
        units: usize,
        #[serde(default = "default_rnn_activation")]
        activation: String,
    },
}

impl LayerConfig {
    /// Builds the layer at `position`, pulling its parameters from `params`.
    pub fn build(&self, position: usize, params: &ParameterStore) -> Result<Layer> {
        let layer: Layer = match self {
            LayerConfig::Rescaling { scale, offset } => Rescale::new(*scale, *offset).into(),
            LayerConfig::Flatten => Flatten::new().into(),
            LayerConfig::Dense {
                input_dim,
                units,
                activation,
                use_bias,
            } => {
                let activation: Activation = activation.parse()?;
                let weight = params.get(position, Dense::KIND, "weight", &[*input_dim, *units])?;
                let bias = if *use_bias {
                    Some(params.get(position, Dense::KIND, "bias", &[*units])?)
                } else {
                    None
                };
                Dense::new(*input_dim, *units, activation, weight, bias)?.into()
            }
            LayerConfig::MaxPooling2D {
                pool_size,
                strides,
                padding,
            } => {
                let padding: Padding = padding.parse()?;
                let strides = strides.as_deref().unwrap_or(pool_size);
                MaxPooling2D::from_slices(pool_size, strides, padding)?.into()
            }
            LayerConfig::Conv2D {
                filters,
                kernel_size,
                strides,
                padding,
                activation,
            } => {
                let size = window_pair(kernel_size, "Conv2D kernel_size")?;
                let stride = match strides {
                    Some(strides) => window_pair(strides, "Conv2D strides")?,
                    None => [1, 1],
                };
                let config = Conv2DConfig::new(*filters, size)
                    .with_stride(stride)
                    .with_padding(padding.parse()?)
                    .with_activation(activation.parse()?);
                // The input channel count is not declared; echo the stored one.
                let channels = params
                    .dims(position, "weight")
                    .and_then(|dims| dims.get(2).copied())
                    .unwrap_or(1);
                let weight = params.get(
                    position,
                    Conv2D::KIND,
                    "weight",
                    &[size[0], size[1], channels, *filters],
                )?;
                let bias = params.get(position, Conv2D::KIND, "bias", &[*filters])?;
                Conv2D::new(config, weight, bias)?.into()
            }
            LayerConfig::Embedding {
                input_dim,
                output_dim,
            } => {
                let weight = params.get(
                    position,
                    Embedding::KIND,
                    "weight",
                    &[*input_dim, *output_dim],
                )?;
                Embedding::new(*input_dim, *output_dim, weight)?.into()
            }
            LayerConfig::SimpleRnn { units, activation } => {
                let activation: Activation = activation.parse()?;
                let input_dim = params
                    .dims(position, "weight_input")
                    .and_then(|dims| dims.first().copied())
                    .unwrap_or(1);
                SimpleRnn::new(
                    *units,
                    activation,
                    params.get(position, SimpleRnn::KIND, "weight_hidden", &[*units, *units])?,
                    params.get(position, SimpleRnn::KIND, "weight_input", &[input_dim, *units])?,
                    params.get(position, SimpleRnn::KIND, "bias", &[*units])?,
                )?
                .into()
            }
        };
        Ok(layer)
    }
}

/// Ordered layer descriptors plus an optional declared input shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// When present the layer chain is shape-checked at build time.
    #[serde(default)]
    pub input_shape: Option<Vec<usize>>,
    pub layers: Vec<LayerConfig>,
}

impl ModelConfig {
    pub fn new(layers: Vec<LayerConfig>) -> Self {
        Self {
            input_shape: None,
            layers,
        }
    }

    pub fn with_input_shape(mut self, shape: Vec<usize>) -> Self {
        self.input_shape = Some(shape);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| NnError::config(format!("invalid model configuration: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| NnError::config(format!("cannot serialize model configuration: {}", e)))
    }

    /// Builds every layer and assembles the model.
    #[instrument(level = "debug", skip_all, fields(layers = self.layers.len()))]
    pub fn build(&self, params: &ParameterStore) -> Result<Model> {
        let layers = self
            .layers
            .iter()
            .enumerate()
            .map(|(position, layer)| layer.build(position, params))
            .collect::<Result<Vec<_>>>()?;
        debug!(parameters = params.len(), "layers built");
        match &self.input_shape {
            Some(shape) => Model::with_input_shape(layers, shape),
            None => Model::new(layers),
        }
    }
}

/// Materialized parameter tensors keyed by `"{position}.{name}"`.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    tensors: HashMap<String, ArrayD<f32>>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, tensor: ArrayD<f32>) {
        self.tensors.insert(key.into(), tensor);
    }

    pub fn with(mut self, key: impl Into<String>, tensor: ArrayD<f32>) -> Self {
        self.insert(key, tensor);
        self
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tensors.contains_key(key)
    }

    /// Shape of a stored parameter, if present.
    pub fn dims(&self, position: usize, name: &str) -> Option<&[usize]> {
        self.tensors
            .get(&format!("{}.{}", position, name))
            .map(|array| array.shape())
    }

    /// Fetches parameter `name` of the `layer` at `position` with the rank `D`.
    ///
    /// A missing key is a configuration error. A tensor of the wrong rank or
    /// with an empty axis is an [`NnError::InvalidParameter`] reporting
    /// `expected`, the shape the layer declares.
    pub fn get<D: Dimension>(
        &self,
        position: usize,
        layer: &'static str,
        name: &'static str,
        expected: &[usize],
    ) -> Result<Tensor<D>> {
        let key = format!("{}.{}", position, name);
        let array = self
            .tensors
            .get(&key)
            .ok_or_else(|| NnError::config(format!("missing parameter '{}'", key)))?;
        let invalid = || NnError::InvalidParameter {
            layer,
            parameter: name,
            expected: expected.to_vec(),
            actual: array.shape().to_vec(),
        };
        if array.shape().contains(&0) {
            return Err(invalid());
        }
        let typed = array
            .clone()
            .into_dimensionality::<D>()
            .map_err(|_| invalid())?;
        Tensor::from_array(typed)
    }
}

impl FromIterator<(String, ArrayD<f32>)> for ParameterStore {
    fn from_iter<I: IntoIterator<Item = (String, ArrayD<f32>)>>(iter: I) -> Self {
        Self {
            tensors: iter.into_iter().collect(),
        }
    }
}
