// --- File: src/nn/pooling.rs ---

//! Module implementing max pooling for HWC images.

use crate::error::{NnError, Result};
use crate::nn::module::Module;
use crate::nn::padding::{window_pair, Padding, WindowGeometry};
use crate::tensor::Tensor3D;
use ndarray::Array3;

/// Max Pooling 2D layer.
///
/// Takes the maximum of every window, channel by channel. Window placement
/// follows the same rules as [`Conv2D`](crate::nn::Conv2D); positions inside
/// the padding count as negative infinity, so padding never wins.
///
/// # Example
///
/// ```rust
/// use seqnet::nn::{MaxPooling2D, Module, Padding};
/// use seqnet::tensor::Tensor3D;
///
/// let pool = MaxPooling2D::new([2, 2], [2, 2], Padding::Valid).unwrap();
/// let image = Tensor3D::new(&[2, 2, 1], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// assert_eq!(pool.forward(&image).unwrap().to_vec(), vec![4.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxPooling2D {
    /// Window size (kh, kw).
    size: [usize; 2],
    /// Stride (sy, sx).
    stride: [usize; 2],
    padding: Padding,
}

impl MaxPooling2D {
    pub fn new(size: [usize; 2], stride: [usize; 2], padding: Padding) -> Result<Self> {
        if size.contains(&0) || stride.contains(&0) {
            return Err(NnError::config(format!(
                "MaxPooling2D size {:?} and stride {:?} must be positive",
                size, stride
            )));
        }
        Ok(Self { size, stride, padding })
    }

    /// Builds the layer from size/stride lists, rejecting anything that is
    /// not exactly two positive components.
    pub fn from_slices(size: &[usize], stride: &[usize], padding: Padding) -> Result<Self> {
        let size = window_pair(size, "MaxPooling2D size")?;
        let stride = window_pair(stride, "MaxPooling2D stride")?;
        Self::new(size, stride, padding)
    }

    /// Creates a pool whose stride equals its window.
    pub fn square(size: usize) -> Result<Self> {
        Self::new([size, size], [size, size], Padding::Valid)
    }

    pub fn size(&self) -> [usize; 2] {
        self.size
    }

    pub fn stride(&self) -> [usize; 2] {
        self.stride
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Window placement for an input of `(height, width)`.
    pub fn geometry(&self, input: (usize, usize)) -> Result<WindowGeometry> {
        WindowGeometry::new(self.padding, input, self.size, self.stride, Self::KIND)
    }
}

impl Module for MaxPooling2D {
    type Input = Tensor3D;
    type Output = Tensor3D;

    const KIND: &'static str = "MaxPooling2D";

    fn forward(&self, input: &Tensor3D) -> Result<Tensor3D> {
        let (in_h, in_w, channels) = input.dims();
        let geometry = self.geometry((in_h, in_w))?;
        let (out_h, out_w) = geometry.output();
        let x = input.array();

        let mut output = Array3::<f32>::from_elem((out_h, out_w, channels), f32::NEG_INFINITY);
        for oy in 0..out_h {
            for ox in 0..out_w {
                for dy in 0..self.size[0] {
                    for dx in 0..self.size[1] {
                        let Some((iy, ix)) = geometry.source((oy, ox), (dy, dx), self.stride, (in_h, in_w)) else {
                            continue;
                        };
                        for c in 0..channels {
                            let cell = &mut output[[oy, ox, c]];
                            *cell = cell.max(x[[iy, ix, c]]);
                        }
                    }
                }
            }
        }
        Ok(Tensor3D::wrap(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_pool_single_window() {
        let pool = MaxPooling2D::new([2, 2], [2, 2], Padding::Valid).unwrap();
        let image = Tensor3D::new(&[2, 2, 1], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let out = pool.forward(&image).unwrap();
        assert_eq!(out.shape(), &[1, 1, 1]);
        assert_eq!(out.to_vec(), vec![4.0]);
    }

    #[test]
    fn test_channels_pooled_independently() {
        let pool = MaxPooling2D::square(2).unwrap();
        // two channels: c0 = 1..4, c1 = 40, 30, 20, 10
        let image = Tensor3D::new(&[2, 2, 2], vec![1.0, 40.0, 2.0, 30.0, 3.0, 20.0, 4.0, 10.0]).unwrap();
        assert_eq!(pool.forward(&image).unwrap().to_vec(), vec![4.0, 40.0]);
    }

    #[test]
    fn test_valid_drops_remainder() {
        let pool = MaxPooling2D::square(2).unwrap();
        let image = Tensor3D::new(&[3, 3, 1], (1..=9).map(|v| v as f32).collect()).unwrap();
        let out = pool.forward(&image).unwrap();
        assert_eq!(out.shape(), &[1, 1, 1]);
        assert_eq!(out.to_vec(), vec![5.0]);
    }

    #[test]
    fn test_same_padding_never_wins() {
        let pool = MaxPooling2D::new([2, 2], [2, 2], Padding::Same).unwrap();
        let image = Tensor3D::new(&[3, 3, 1], (1..=9).map(|v| -(v as f32)).collect()).unwrap();
        let out = pool.forward(&image).unwrap();
        assert_eq!(out.shape(), &[2, 2, 1]);
        assert_eq!(out.to_vec(), vec![-1.0, -3.0, -7.0, -9.0]);
    }

    #[test]
    fn test_overlapping_windows() {
        let pool = MaxPooling2D::new([2, 2], [1, 1], Padding::Valid).unwrap();
        let image = Tensor3D::new(&[3, 3, 1], vec![1.0, 9.0, 1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0]).unwrap();
        assert_eq!(pool.forward(&image).unwrap().to_vec(), vec![9.0, 9.0, 5.0, 1.0]);
    }

    #[test]
    fn test_window_arity_checked() {
        assert!(matches!(
            MaxPooling2D::from_slices(&[2], &[2, 2], Padding::Valid),
            Err(NnError::Configuration(_))
        ));
        assert!(matches!(
            MaxPooling2D::from_slices(&[2, 2], &[], Padding::Valid),
            Err(NnError::Configuration(_))
        ));
        assert!(MaxPooling2D::from_slices(&[2, 2], &[2, 2], Padding::Same).is_ok());
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(matches!(
            MaxPooling2D::new([2, 2], [0, 2], Padding::Same),
            Err(NnError::Configuration(_))
        ));
        let pool = MaxPooling2D::new([3, 2], [1, 2], Padding::Same).unwrap();
        assert_eq!(pool.size(), [3, 2]);
        assert_eq!(pool.stride(), [1, 2]);
        assert_eq!(pool.padding(), Padding::Same);
    }

    #[test]
    fn test_input_smaller_than_window() {
        let pool = MaxPooling2D::square(3).unwrap();
        let image = Tensor3D::new(&[2, 2, 1], vec![0.0; 4]).unwrap();
        assert!(matches!(pool.forward(&image), Err(NnError::ShapeMismatch { .. })));
    }
}
