//! Module for static shape inference over a layer list.
//!
//! Walks the layers in order and determines the shape each one produces,
//! based on the incoming shape and the layer's declared dimensions. This
//! lets a model with a known input shape be rejected when it is assembled
//! instead of on its first forward call.

use crate::error::{NnError, Result};
use crate::nn::Layer;

/// Shape of a [`Value`](crate::nn::Value) flowing between layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// Index or scalar (rank 0).
    Scalar,
    /// Vector of the given length.
    Vector(usize),
    /// HWC image.
    Image([usize; 3]),
}

impl ValueShape {
    /// Interprets a dimension list: `[]` is a scalar, `[n]` a vector and
    /// `[h, w, c]` an image. Other ranks never flow between layers.
    pub fn from_dims(dims: &[usize]) -> Result<Self> {
        if dims.contains(&0) {
            return Err(NnError::config(format!(
                "input shape {:?} has a zero-length axis",
                dims
            )));
        }
        match dims {
            [] => Ok(ValueShape::Scalar),
            [n] => Ok(ValueShape::Vector(*n)),
            [h, w, c] => Ok(ValueShape::Image([*h, *w, *c])),
            other => Err(NnError::config(format!(
                "unsupported input rank {} (shape {:?}); expected 0, 1 or 3",
                other.len(),
                other
            ))),
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            ValueShape::Scalar => 0,
            ValueShape::Vector(_) => 1,
            ValueShape::Image(_) => 3,
        }
    }

    pub fn dims(&self) -> Vec<usize> {
        match self {
            ValueShape::Scalar => Vec::new(),
            ValueShape::Vector(n) => vec![*n],
            ValueShape::Image(dims) => dims.to_vec(),
        }
    }
}

/// Structure that performs shape inference over a layer list.
pub struct ShapeInference;

impl ShapeInference {
    /// Returns the output shape of every layer, in order.
    ///
    /// Fails at the first layer that cannot accept its incoming shape; the
    /// error context names the layer position and kind.
    pub fn run(layers: &[Layer], input: &ValueShape) -> Result<Vec<ValueShape>> {
        let mut shapes = Vec::with_capacity(layers.len());
        let mut current = *input;
        for (position, layer) in layers.iter().enumerate() {
            current = layer
                .output_shape(&current)
                .map_err(|e| e.at_layer(position, layer.kind()))?;
            shapes.push(current);
        }
        Ok(shapes)
    }

    /// Output shape of the whole layer list.
    pub fn output(layers: &[Layer], input: &ValueShape) -> Result<ValueShape> {
        Ok(Self::run(layers, input)?.last().copied().unwrap_or(*input))
    }
}
