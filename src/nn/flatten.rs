//! Flattening of HWC images into vectors.

use crate::error::Result;
use crate::nn::module::Module;
use crate::tensor::{Tensor1D, Tensor3D};

/// Reinterprets an `[h, w, c]` image as a vector of length `h * w * c`.
///
/// The order is height outermost, width next, channel innermost. Dense
/// weights following a `Flatten` are laid out against exactly this order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flatten;

impl Flatten {
    pub fn new() -> Self {
        Flatten
    }
}

impl Module for Flatten {
    type Input = Tensor3D;
    type Output = Tensor1D;

    const KIND: &'static str = "Flatten";

    fn forward(&self, input: &Tensor3D) -> Result<Tensor1D> {
        Ok(input.flatten())
    }
}
