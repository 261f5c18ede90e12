//! The data item that flows from one layer to the next.

use crate::analysis::shape_inference::ValueShape;
use crate::tensor::{Tensor1D, Tensor3D};

/// Input or output of a layer.
///
/// Indices and scalars have rank 0 and are only consumed by an embedding
/// lookup; every other layer reads vectors (rank 1) or HWC images (rank 3).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Index(i64),
    Scalar(f32),
    Vector(Tensor1D),
    Image(Tensor3D),
}

impl Value {
    pub fn rank(&self) -> usize {
        match self {
            Value::Index(_) | Value::Scalar(_) => 0,
            Value::Vector(_) => 1,
            Value::Image(_) => 3,
        }
    }

    pub fn shape(&self) -> ValueShape {
        match self {
            Value::Index(_) | Value::Scalar(_) => ValueShape::Scalar,
            Value::Vector(v) => ValueShape::Vector(v.len()),
            Value::Image(image) => {
                let (h, w, c) = image.dims();
                ValueShape::Image([h, w, c])
            }
        }
    }

    pub fn as_vector(&self) -> Option<&Tensor1D> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Tensor3D> {
        match self {
            Value::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn into_vector(self) -> Option<Tensor1D> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_image(self) -> Option<Tensor3D> {
        match self {
            Value::Image(image) => Some(image),
            _ => None,
        }
    }
}

impl From<Tensor1D> for Value {
    fn from(v: Tensor1D) -> Self {
        Value::Vector(v)
    }
}

impl From<Tensor3D> for Value {
    fn from(image: Tensor3D) -> Self {
        Value::Image(image)
    }
}

impl From<i64> for Value {
    fn from(index: i64) -> Self {
        Value::Index(index)
    }
}
