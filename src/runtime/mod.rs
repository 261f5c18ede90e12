//! Execution of assembled models.
//!
//! `sequential` evaluates a layer list front to back and owns the
//! separation between immutable model parameters and per-sequence state.

pub mod sequential;

pub use sequential::{Model, ModelState, Session};
