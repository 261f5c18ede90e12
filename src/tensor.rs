//! Module defining the shaped numeric containers used by every layer.
//!
//! A `Tensor<D>` is a dense, row-major `f32` array of fixed rank backed by
//! `ndarray`. Only ranks 1 to 4 are used by the engine and each has an alias:
//!
//! - [`Tensor1D`]: vectors (dense activations, biases, recurrent state)
//! - [`Tensor2D`]: matrices (dense and recurrent weights, embedding tables)
//! - [`Tensor3D`]: images in `[height, width, channels]` layout
//! - [`Tensor4D`]: convolution kernels in `[kh, kw, in_channels, filters]` layout
//!
//! Tensors are plain values. Every operation below allocates a fresh backing
//! store, nothing aliases its input.

use crate::error::{NnError, Result};
use ndarray::{
    Array, Array1, Array3, ArrayD, Axis, Dimension, Ix1, Ix2, Ix3, Ix4, IxDyn, ShapeBuilder,
};

/// Dense `f32` tensor of rank `D`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<D: Dimension> {
    data: Array<f32, D>,
}

pub type Tensor1D = Tensor<Ix1>;
pub type Tensor2D = Tensor<Ix2>;
pub type Tensor3D = Tensor<Ix3>;
pub type Tensor4D = Tensor<Ix4>;

impl<D: Dimension> Tensor<D> {
    /// Builds a tensor from an explicit shape and a flat row-major value sequence.
    ///
    /// Fails if the shape length differs from the tensor rank, if any axis is
    /// zero, or if `values.len()` is not the product of the shape.
    pub fn new(shape: &[usize], values: Vec<f32>) -> Result<Self> {
        if let Some(rank) = D::NDIM {
            if shape.len() != rank {
                return Err(NnError::shape(
                    "tensor construction",
                    format!("rank {}", rank),
                    format!("rank {} shape {:?}", shape.len(), shape),
                ));
            }
        }
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(NnError::shape(
                "tensor construction",
                format!("{} values for shape {:?}", expected, shape),
                format!("{} values", values.len()),
            ));
        }
        let dynamic = ArrayD::from_shape_vec(IxDyn(shape), values)
            .map_err(|e| NnError::shape("tensor construction", format!("{:?}", shape), e.to_string()))?;
        let data = dynamic
            .into_dimensionality::<D>()
            .map_err(|e| NnError::shape("tensor construction", format!("{:?}", shape), e.to_string()))?;
        Self::from_array(data)
    }

    /// Wraps an existing array. Zero-length axes are rejected.
    pub fn from_array(data: Array<f32, D>) -> Result<Self> {
        if data.shape().iter().any(|&axis| axis == 0) {
            return Err(NnError::shape(
                "tensor construction",
                "positive axis lengths",
                format!("{:?}", data.shape()),
            ));
        }
        Ok(Self { data })
    }

    /// Wraps an array produced by a layer computation, whose shape is known to be valid.
    pub(crate) fn wrap(data: Array<f32, D>) -> Self {
        Self { data }
    }

    /// All-zero tensor of the given shape.
    pub fn zeros<Sh: ShapeBuilder<Dim = D>>(shape: Sh) -> Self {
        Self {
            data: Array::zeros(shape),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn rank(&self) -> usize {
        self.data.ndim()
    }

    /// Number of elements (product of the shape).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Values in row-major (last axis fastest) order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    pub fn array(&self) -> &Array<f32, D> {
        &self.data
    }

    pub fn into_array(self) -> Array<f32, D> {
        self.data
    }

    /// Applies `f` to every element.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f32) -> f32,
    {
        Self {
            data: self.data.mapv(f),
        }
    }

    /// Elementwise affine transform `x * scale + offset`.
    pub fn rescale(&self, scale: f32, offset: f32) -> Self {
        self.map(|x| x * scale + offset)
    }

    /// Adds `bias` to every lane along the last axis.
    pub fn add_bias(&self, bias: &Tensor1D) -> Result<Self> {
        let last = Axis(self.data.ndim() - 1);
        let channels = self.data.len_of(last);
        if bias.len() != channels {
            return Err(NnError::shape(
                "bias addition",
                format!("bias of length {}", channels),
                format!("bias of length {}", bias.len()),
            ));
        }
        let mut data = self.data.clone();
        for mut lane in data.lanes_mut(last) {
            lane += &bias.data;
        }
        Ok(Self { data })
    }
}

impl Tensor1D {
    pub fn from_vec(values: Vec<f32>) -> Result<Self> {
        Self::from_array(Array1::from(values))
    }

    /// Row-vector by matrix product `self · matrix`.
    pub fn matmul(&self, matrix: &Tensor2D) -> Result<Tensor1D> {
        let (rows, _) = matrix.data.dim();
        if self.len() != rows {
            return Err(NnError::shape(
                "vector-matrix product",
                format!("vector of length {}", rows),
                format!("vector of length {}", self.len()),
            ));
        }
        Ok(Tensor1D::wrap(self.data.dot(&matrix.data)))
    }

    /// Elementwise sum of two equally sized vectors.
    pub fn add(&self, other: &Tensor1D) -> Result<Tensor1D> {
        if self.len() != other.len() {
            return Err(NnError::shape(
                "vector addition",
                format!("length {}", self.len()),
                format!("length {}", other.len()),
            ));
        }
        Ok(Tensor1D::wrap(&self.data + &other.data))
    }

    /// Inverse of [`Tensor3D::flatten`].
    pub fn reshape3(&self, shape: [usize; 3]) -> Result<Tensor3D> {
        let [h, w, c] = shape;
        if h * w * c != self.len() {
            return Err(NnError::shape(
                "reshape",
                format!("{} elements for shape {:?}", h * w * c, shape),
                format!("{} elements", self.len()),
            ));
        }
        let data = Array3::from_shape_vec((h, w, c), self.to_vec())
            .map_err(|e| NnError::shape("reshape", format!("{:?}", shape), e.to_string()))?;
        Tensor3D::from_array(data)
    }
}

impl Tensor2D {
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Copy of row `index`.
    pub fn row(&self, index: usize) -> Result<Tensor1D> {
        if index >= self.rows() {
            return Err(NnError::IndexOutOfRange {
                index: index as f64,
                len: self.rows(),
            });
        }
        Ok(Tensor1D::wrap(self.data.row(index).to_owned()))
    }
}

impl Tensor3D {
    /// `(height, width, channels)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Row-major concatenation: height outermost, then width, channel innermost.
    pub fn flatten(&self) -> Tensor1D {
        Tensor1D::wrap(self.data.iter().copied().collect())
    }
}

impl Tensor4D {
    /// `(kernel_h, kernel_w, in_channels, filters)`.
    pub fn dims(&self) -> (usize, usize, usize, usize) {
        self.data.dim()
    }
}
