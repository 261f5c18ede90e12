//! # seqnet: forward inference for sequential neural networks
//!
//! **seqnet** evaluates already-trained sequential models on the CPU.
//! A model is an ordered list of layers, each consuming the previous
//! layer's output:
//!
//! - Image layers work on `[height, width, channels]` tensors:
//!   [`Rescale`](nn::Rescale), [`Conv2D`](nn::Conv2D),
//!   [`MaxPooling2D`](nn::MaxPooling2D) and [`Flatten`](nn::Flatten).
//! - Vector layers: [`Dense`](nn::Dense) and [`SimpleRnn`](nn::SimpleRnn).
//! - Scalar input: [`Embedding`](nn::Embedding) maps an index to a vector.
//!
//! Model parameters are immutable after assembly. Recurrent hidden state
//! lives in a separate [`ModelState`], so a single [`Model`] can be shared
//! across threads while each sequence carries its own state.
//!
//! ## Usage Example
//!
//! ```rust
//! use seqnet::nn::{Activation, Dense, Flatten, Layer, Rescale, Value};
//! use seqnet::tensor::{Tensor2D, Tensor3D};
//! use seqnet::Model;
//!
//! let weight = Tensor2D::new(&[4, 2], vec![1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]).unwrap();
//! let model = Model::with_input_shape(
//!     vec![
//!         Layer::from(Rescale::new(1.0 / 255.0, 0.0)),
//!         Layer::from(Flatten::new()),
//!         Layer::from(Dense::new(4, 2, Activation::Softmax, weight, None).unwrap()),
//!     ],
//!     &[2, 2, 1],
//! )
//! .unwrap();
//!
//! let image = Tensor3D::new(&[2, 2, 1], vec![0.0, 255.0, 0.0, 255.0]).unwrap();
//! let probabilities = model.evaluate(Value::Image(image)).unwrap().into_vector().unwrap();
//! assert!((probabilities.to_vec().iter().sum::<f32>() - 1.0).abs() < 1e-6);
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod nn;
pub mod runtime;
pub mod tensor;

pub use config::{LayerConfig, ModelConfig, ParameterStore};
pub use error::{NnError, Result};
pub use runtime::{Model, ModelState, Session};
