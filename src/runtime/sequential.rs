//! Sequential model evaluation.
//!
//! A [`Model`] is an immutable, ordered list of layers. Recurrent hidden
//! state is kept apart in a [`ModelState`] with one slot per layer position,
//! so a single model can drive any number of independent sequences (one
//! state each), including from several threads.

use crate::analysis::shape_inference::{ShapeInference, ValueShape};
use crate::error::{NnError, Result};
use crate::nn::{Layer, RecurrentState, Value};
use tracing::{debug, instrument, trace};

/// Ordered, immutable list of layers evaluated front to back.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    layers: Vec<Layer>,
    input_shape: Option<ValueShape>,
}

impl Model {
    /// Assembles a model. Parameter shapes were already checked when each
    /// layer was constructed.
    #[instrument(level = "debug", skip_all, fields(layers = layers.len()))]
    pub fn new(layers: Vec<Layer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(NnError::config("a model needs at least one layer"));
        }
        debug!(stateful = layers.iter().any(Layer::is_stateful), "model assembled");
        Ok(Self {
            layers,
            input_shape: None,
        })
    }

    /// Assembles a model with a declared input shape and checks the whole
    /// layer chain against it, so rank and dimension errors surface now
    /// rather than on the first forward call.
    #[instrument(level = "debug", skip_all, fields(layers = layers.len(), input = ?input_shape))]
    pub fn with_input_shape(layers: Vec<Layer>, input_shape: &[usize]) -> Result<Self> {
        let shape = ValueShape::from_dims(input_shape)?;
        let mut model = Self::new(layers)?;
        let output = ShapeInference::output(&model.layers, &shape)?;
        debug!(output = ?output, "shape inference passed");
        model.input_shape = Some(shape);
        Ok(model)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn input_shape(&self) -> Option<ValueShape> {
        self.input_shape
    }

    /// Whether any layer carries state between forward calls.
    pub fn is_stateful(&self) -> bool {
        self.layers.iter().any(Layer::is_stateful)
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Output shape for an input of shape `input`, without evaluating anything.
    pub fn output_shape(&self, input: &[usize]) -> Result<ValueShape> {
        ShapeInference::output(&self.layers, &ValueShape::from_dims(input)?)
    }

    /// Zeroed state with one slot per layer.
    pub fn initial_state(&self) -> ModelState {
        ModelState {
            slots: self.layers.iter().map(Layer::initial_state).collect(),
        }
    }

    /// Borrows the model together with a fresh state.
    pub fn session(&self) -> Session<'_> {
        Session::new(self)
    }

    /// Runs one forward pass, reading and updating `state`.
    ///
    /// Stops at the first layer whose expected input rank differs from the
    /// incoming value's; no later layer runs. On any error `state` is left
    /// exactly as it was, including recurrent layers that ran before the
    /// failing one.
    #[instrument(level = "debug", skip_all, fields(layers = self.layers.len(), input_rank = input.rank()))]
    pub fn forward(&self, state: &mut ModelState, input: Value) -> Result<Value> {
        if state.slots.len() != self.layers.len() {
            return Err(NnError::shape(
                "model state",
                format!("{} layer slots", self.layers.len()),
                format!("{} layer slots", state.slots.len()),
            ));
        }

        // Recurrent updates land in a scratch copy and are committed only
        // once every layer has succeeded.
        let mut slots = state.slots.clone();
        let mut value = input;
        for (position, (layer, slot)) in self.layers.iter().zip(slots.iter_mut()).enumerate() {
            if value.rank() != layer.input_rank() {
                return Err(NnError::shape(
                    format!("layer {} ({})", position, layer.kind()),
                    format!("rank {} input", layer.input_rank()),
                    format!("rank {} input {:?}", value.rank(), value.shape()),
                ));
            }
            value = layer
                .forward(slot.as_mut(), value)
                .map_err(|e| e.at_layer(position, layer.kind()))?;
            trace!(position, kind = layer.kind(), output = ?value.shape(), "layer done");
        }
        state.slots = slots;
        Ok(value)
    }

    /// Evaluates `input` from a fresh zero state.
    ///
    /// For stateless models this is the whole story. For recurrent models
    /// each call is an independent one-step sequence; use a [`Session`] to
    /// feed a sequence step by step.
    pub fn evaluate(&self, input: Value) -> Result<Value> {
        let mut state = self.initial_state();
        self.forward(&mut state, input)
    }
}

/// Recurrent state of every layer of one model, indexed by layer position.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelState {
    slots: Vec<Option<RecurrentState>>,
}

impl ModelState {
    /// Zeroes every recurrent slot.
    pub fn reset(&mut self) {
        for state in self.slots.iter_mut().flatten() {
            state.reset();
        }
    }

    /// Number of layer slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// State of the recurrent layer at `position`, if that layer is recurrent.
    pub fn recurrent(&self, position: usize) -> Option<&RecurrentState> {
        self.slots.get(position).and_then(Option::as_ref)
    }
}

/// A model borrowed together with the state of one sequence.
///
/// ```rust,ignore
/// let mut session = model.session();
/// let outputs = session.evaluate_sequence(tokens.into_iter().map(Value::Index))?;
/// ```
#[derive(Debug, Clone)]
pub struct Session<'m> {
    model: &'m Model,
    state: ModelState,
}

impl<'m> Session<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self {
            model,
            state: model.initial_state(),
        }
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    /// Continues the current sequence with one more input.
    pub fn evaluate(&mut self, input: Value) -> Result<Value> {
        self.model.forward(&mut self.state, input)
    }

    /// Starts a new sequence.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Starts a new sequence and feeds it every input in order, returning the
    /// output of each step.
    #[instrument(level = "debug", skip_all)]
    pub fn evaluate_sequence<I>(&mut self, inputs: I) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = Value>,
    {
        self.reset();
        let outputs = inputs
            .into_iter()
            .map(|input| self.evaluate(input))
            .collect::<Result<Vec<_>>>()?;
        debug!(steps = outputs.len(), "sequence evaluated");
        Ok(outputs)
    }
}
