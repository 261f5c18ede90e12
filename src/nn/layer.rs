//! Sum type over every layer kind and the single dispatch used by the model.

use crate::analysis::shape_inference::ValueShape;
use crate::error::{NnError, Result};
use crate::nn::conv::Conv2D;
use crate::nn::dense::Dense;
use crate::nn::embedding::Embedding;
use crate::nn::flatten::Flatten;
use crate::nn::module::Module;
use crate::nn::pooling::MaxPooling2D;
use crate::nn::recurrent::{RecurrentState, SimpleRnn};
use crate::nn::rescale::Rescale;
use crate::nn::value::Value;

/// One step of a sequential model.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Rescale(Rescale),
    Flatten(Flatten),
    Dense(Dense),
    MaxPooling2D(MaxPooling2D),
    Conv2D(Conv2D),
    Embedding(Embedding),
    SimpleRnn(SimpleRnn),
}

impl Layer {
    pub fn kind(&self) -> &'static str {
        match self {
            Layer::Rescale(_) => Rescale::KIND,
            Layer::Flatten(_) => Flatten::KIND,
            Layer::Dense(_) => Dense::KIND,
            Layer::MaxPooling2D(_) => MaxPooling2D::KIND,
            Layer::Conv2D(_) => Conv2D::KIND,
            Layer::Embedding(_) => Embedding::KIND,
            Layer::SimpleRnn(_) => SimpleRnn::KIND,
        }
    }

    /// Rank of the value this layer consumes (0 for an embedding index).
    pub fn input_rank(&self) -> usize {
        match self {
            Layer::Embedding(_) => 0,
            Layer::Dense(_) | Layer::SimpleRnn(_) => 1,
            Layer::Rescale(_) | Layer::Flatten(_) | Layer::MaxPooling2D(_) | Layer::Conv2D(_) => 3,
        }
    }

    /// Whether the layer carries hidden state between forward calls.
    pub fn is_stateful(&self) -> bool {
        matches!(self, Layer::SimpleRnn(_))
    }

    /// Fresh state for stateful layers, `None` for the others.
    pub fn initial_state(&self) -> Option<RecurrentState> {
        match self {
            Layer::SimpleRnn(rnn) => Some(rnn.initial_state()),
            _ => None,
        }
    }

    pub fn parameter_count(&self) -> usize {
        match self {
            Layer::Rescale(layer) => layer.parameter_count(),
            Layer::Flatten(layer) => layer.parameter_count(),
            Layer::Dense(layer) => layer.parameter_count(),
            Layer::MaxPooling2D(layer) => layer.parameter_count(),
            Layer::Conv2D(layer) => layer.parameter_count(),
            Layer::Embedding(layer) => layer.parameter_count(),
            Layer::SimpleRnn(layer) => layer.parameter_count(),
        }
    }

    /// Runs the layer on `input`.
    ///
    /// `state` must be the slot created by [`Layer::initial_state`] for this
    /// layer; it is only read and written by recurrent layers.
    pub fn forward(&self, state: Option<&mut RecurrentState>, input: Value) -> Result<Value> {
        match (self, input) {
            (Layer::Rescale(layer), Value::Image(x)) => layer.forward(&x).map(Value::Image),
            (Layer::Flatten(layer), Value::Image(x)) => layer.forward(&x).map(Value::Vector),
            (Layer::Dense(layer), Value::Vector(x)) => layer.forward(&x).map(Value::Vector),
            (Layer::MaxPooling2D(layer), Value::Image(x)) => layer.forward(&x).map(Value::Image),
            (Layer::Conv2D(layer), Value::Image(x)) => layer.forward(&x).map(Value::Image),
            (Layer::Embedding(layer), Value::Index(index)) => layer.forward(&index).map(Value::Vector),
            (Layer::Embedding(layer), Value::Scalar(index)) => {
                layer.lookup_scalar(index).map(Value::Vector)
            }
            (Layer::SimpleRnn(layer), Value::Vector(x)) => {
                let state = state.ok_or_else(|| {
                    NnError::shape(SimpleRnn::KIND, "a recurrent state slot", "no state")
                })?;
                layer.forward(state, &x).map(Value::Vector)
            }
            (layer, other) => Err(NnError::shape(
                layer.kind(),
                format!("rank {} input", layer.input_rank()),
                format!("rank {} input {:?}", other.rank(), other.shape()),
            )),
        }
    }

    /// Shape produced by this layer for an input of shape `input`.
    pub fn output_shape(&self, input: &ValueShape) -> Result<ValueShape> {
        let mismatch = |expected: String| {
            Err(NnError::shape(self.kind(), expected, format!("{:?}", input)))
        };
        match (self, input) {
            (Layer::Rescale(_), ValueShape::Image(dims)) => Ok(ValueShape::Image(*dims)),
            (Layer::Flatten(_), ValueShape::Image([h, w, c])) => Ok(ValueShape::Vector(h * w * c)),
            (Layer::Dense(dense), ValueShape::Vector(n)) if *n == dense.input_dim() => {
                Ok(ValueShape::Vector(dense.out_dim()))
            }
            (Layer::Dense(dense), _) => mismatch(format!("Vector({})", dense.input_dim())),
            (Layer::MaxPooling2D(pool), ValueShape::Image([h, w, c])) => {
                let (out_h, out_w) = pool.geometry((*h, *w))?.output();
                Ok(ValueShape::Image([out_h, out_w, *c]))
            }
            (Layer::Conv2D(conv), ValueShape::Image([h, w, c])) if *c == conv.in_channels() => {
                let (out_h, out_w) = conv.geometry((*h, *w))?.output();
                Ok(ValueShape::Image([out_h, out_w, conv.config().filters]))
            }
            (Layer::Conv2D(conv), _) => {
                mismatch(format!("Image([_, _, {}])", conv.in_channels()))
            }
            (Layer::Embedding(embedding), ValueShape::Scalar) => {
                Ok(ValueShape::Vector(embedding.output_dim()))
            }
            (Layer::SimpleRnn(rnn), ValueShape::Vector(n)) if *n == rnn.input_dim() => {
                Ok(ValueShape::Vector(rnn.units()))
            }
            (Layer::SimpleRnn(rnn), _) => mismatch(format!("Vector({})", rnn.input_dim())),
            _ => mismatch(format!("rank {} input", self.input_rank())),
        }
    }
}

impl From<Rescale> for Layer {
    fn from(layer: Rescale) -> Self {
        Layer::Rescale(layer)
    }
}

impl From<Flatten> for Layer {
    fn from(layer: Flatten) -> Self {
        Layer::Flatten(layer)
    }
}

impl From<Dense> for Layer {
    fn from(layer: Dense) -> Self {
        Layer::Dense(layer)
    }
}

impl From<MaxPooling2D> for Layer {
    fn from(layer: MaxPooling2D) -> Self {
        Layer::MaxPooling2D(layer)
    }
}

impl From<Conv2D> for Layer {
    fn from(layer: Conv2D) -> Self {
        Layer::Conv2D(layer)
    }
}

impl From<Embedding> for Layer {
    fn from(layer: Embedding) -> Self {
        Layer::Embedding(layer)
    }
}

impl From<SimpleRnn> for Layer {
    fn from(layer: SimpleRnn) -> Self {
        Layer::SimpleRnn(layer)
    }
}
