//! Module with the Embedding layer.
//!
//! The Embedding layer maps an integer index to a dense vector of fixed
//! size by copying one row of its weight table. Typically used to turn
//! token ids into the inputs of a recurrent layer.

use super::module::Module;
use crate::error::{NnError, Result};
use crate::tensor::{Tensor1D, Tensor2D};

/// Embedding lookup table.
///
/// # Example
///
/// ```ignore
/// use seqnet::nn::Embedding;
///
/// let embedding = Embedding::new(10000, 256, weight)?; // weight: [10000, 256]
/// let vector = embedding.lookup(42)?;                 // [256]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// Number of distinct indices (vocabulary size).
    input_dim: usize,
    /// Length of each embedding vector.
    output_dim: usize,
    /// Table of shape [input_dim, output_dim].
    weight: Tensor2D,
}

impl Embedding {
    /// Creates an embedding layer from a materialized weight table.
    ///
    /// # Arguments
    ///
    /// * `input_dim` - Vocabulary size
    /// * `output_dim` - Embedding vector length
    /// * `weight` - Table of shape [input_dim, output_dim]
    pub fn new(input_dim: usize, output_dim: usize, weight: Tensor2D) -> Result<Self> {
        if weight.shape() != [input_dim, output_dim] {
            return Err(NnError::InvalidParameter {
                layer: Self::KIND,
                parameter: "weight",
                expected: vec![input_dim, output_dim],
                actual: weight.shape().to_vec(),
            });
        }
        Ok(Self {
            input_dim,
            output_dim,
            weight,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Returns a copy of row `index`.
    pub fn lookup(&self, index: i64) -> Result<Tensor1D> {
        let out_of_range = NnError::IndexOutOfRange {
            index: index as f64,
            len: self.input_dim,
        };
        let row = usize::try_from(index).map_err(|_| out_of_range.clone())?;
        if row >= self.input_dim {
            return Err(out_of_range);
        }
        self.weight.row(row)
    }

    /// Lookup with an index carried as a float. The value must be a finite integer.
    pub fn lookup_scalar(&self, index: f32) -> Result<Tensor1D> {
        if !index.is_finite()
            || index.fract() != 0.0
            || index < 0.0
            || f64::from(index) >= self.input_dim as f64
        {
            return Err(NnError::IndexOutOfRange {
                index: f64::from(index),
                len: self.input_dim,
            });
        }
        self.lookup(index as i64)
    }
}

impl Module for Embedding {
    type Input = i64;
    type Output = Tensor1D;

    const KIND: &'static str = "Embedding";

    fn forward(&self, index: &i64) -> Result<Tensor1D> {
        self.lookup(*index)
    }

    fn parameter_count(&self) -> usize {
        self.weight.len()
    }
}
