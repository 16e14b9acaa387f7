//! Errors in the library.
use thiserror::Error;

/// Errors raised by agents, replay memories and exploration policies.
///
/// Functions in this workspace return [`anyhow::Result`]; the typed error can be
/// recovered with `err.downcast_ref::<BellmanError>()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BellmanError {
    /// Invalid constructor argument or incompatible persisted state.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// More transitions were requested than the replay memory holds.
    #[error("Insufficient data: requested {requested} transitions, {available} available")]
    InsufficientData {
        /// Number of transitions requested.
        requested: usize,
        /// Number of transitions stored.
        available: usize,
    },

    /// An observation or action does not match the configured spaces.
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Description of the expected shape.
        expected: String,
        /// Description of the given shape.
        actual: String,
    },

    /// The key was not found in a record.
    #[error("Record key error: {0}")]
    RecordKeyError(String),
}

impl BellmanError {
    /// Shorthand for [`BellmanError::Configuration`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Shorthand for [`BellmanError::ShapeMismatch`].
    pub fn shape_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
