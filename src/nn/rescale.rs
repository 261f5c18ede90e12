//! Elementwise affine input scaling.

use crate::error::Result;
use crate::nn::module::Module;
use crate::tensor::Tensor3D;

/// Computes `input * scale + offset` on an HWC image, typically to map raw
/// pixel values into the range the rest of the network was trained on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rescale {
    pub scale: f32,
    pub offset: f32,
}

impl Rescale {
    pub fn new(scale: f32, offset: f32) -> Self {
        Self { scale, offset }
    }
}

impl Module for Rescale {
    type Input = Tensor3D;
    type Output = Tensor3D;

    const KIND: &'static str = "Rescale";

    fn forward(&self, input: &Tensor3D) -> Result<Tensor3D> {
        Ok(input.rescale(self.scale, self.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale_pixels() {
        let image = Tensor3D::new(&[1, 2, 1], vec![0.0, 255.0]).unwrap();
        let out = Rescale::new(1.0 / 255.0, 0.0).forward(&image).unwrap();
        assert_eq!(out.shape(), &[1, 2, 1]);
        let values = out.to_vec();
        assert_eq!(values[0], 0.0);
        assert!((values[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rescale_offset() {
        let image = Tensor3D::new(&[2, 1, 1], vec![1.0, 3.0]).unwrap();
        let out = Rescale::new(0.5, -1.0).forward(&image).unwrap();
        assert_eq!(out.to_vec(), vec![-0.5, 0.5]);
    }
}
