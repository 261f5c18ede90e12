//! # Model Analysis Module
//!
//! Passes that inspect a layer list before anything is evaluated.
//!
//! - [`ShapeInference`](shape_inference::ShapeInference): propagates value
//!   shapes through the layers, detecting rank and dimension mismatches at
//!   model assembly time.
//!
//! ```text
//! input shape -> Rescale -> Conv2D -> MaxPooling2D -> Flatten -> Dense -> output shape
//! ```

pub mod shape_inference;

pub use shape_inference::{ShapeInference, ValueShape};
