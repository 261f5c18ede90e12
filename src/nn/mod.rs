//! # Neural Network Layers Module
//!
//! Concrete forward computations for every layer kind supported by a
//! sequential model, plus the shared pieces they are built from.
//!
//! ## Available Layers
//!
//! ### Preprocessing
//! - [`Rescale`]: elementwise `x * scale + offset`
//! - [`Flatten`]: HWC image to vector, row-major
//!
//! ### Core Layers
//! - [`Dense`]: fully connected layer
//! - [`Conv2D`]: 2D convolution with stride and `valid`/`same` padding
//! - [`MaxPooling2D`]: windowed maximum
//! - [`Embedding`]: index to vector lookup
//!
//! ### Recurrent
//! - [`SimpleRnn`]: Elman recurrent layer; its hidden state is a separate
//!   [`RecurrentState`]
//!
//! ### Activations
//! - [`Activation`]: linear, ReLU, sigmoid, tanh, softmax
//!
//! ## Example
//!
//! ```rust
//! use seqnet::nn::{Activation, Dense, Layer, Value};
//! use seqnet::tensor::{Tensor1D, Tensor2D};
//!
//! let weight = Tensor2D::new(&[2, 1], vec![1.0, 1.0]).unwrap();
//! let dense = Dense::new(2, 1, Activation::Relu, weight, None).unwrap();
//! let layer = Layer::from(dense);
//!
//! let x = Value::Vector(Tensor1D::from_vec(vec![2.0, -5.0]).unwrap());
//! let y = layer.forward(None, x).unwrap();
//! assert_eq!(y.into_vector().unwrap().to_vec(), vec![0.0]);
//! ```

pub mod activations;
pub mod conv;
pub mod dense;
pub mod embedding;
pub mod flatten;
pub mod layer;
pub mod module;
pub mod padding;
pub mod pooling;
pub mod recurrent;
pub mod rescale;
pub mod value;

pub use activations::Activation;
pub use conv::{Conv2D, Conv2DConfig};
pub use dense::Dense;
pub use embedding::Embedding;
pub use flatten::Flatten;
pub use layer::Layer;
pub use module::Module;
pub use padding::{Padding, WindowGeometry};
pub use pooling::MaxPooling2D;
pub use recurrent::{RecurrentState, SimpleRnn};
pub use rescale::Rescale;
pub use value::Value;
