//! Error types.

use crate::ConfigSet;
use std::sync::Arc;
use thiserror::Error;

/// Failure raised by a prediction engine.
///
/// The profiler records these as [`ErrorInfo`](crate::ErrorInfo) events but
/// never swallows or rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    /// No configuration survived the lookahead symbol at `offending_index`.
    #[error("no viable alternative for decision {decision} at token {offending_index} (prediction started at {start_index})")]
    NoViableAlt { decision: usize, start_index: usize, offending_index: usize, configs: Arc<ConfigSet> },
}

impl PredictionError {
    pub fn decision(&self) -> usize {
        match self {
            PredictionError::NoViableAlt { decision, .. } => *decision,
        }
    }

    pub fn offending_index(&self) -> usize {
        match self {
            PredictionError::NoViableAlt { offending_index, .. } => *offending_index,
        }
    }
}

/// Crate-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A prediction failed while parsing.
    #[error(transparent)]
    Prediction(#[from] PredictionError),

    /// The ATN description is inconsistent.
    #[error("invalid ATN: {message}")]
    InvalidAtn { message: String },

    /// Input text could not be tokenized.
    #[error("unrecognized input at byte {offset}: {snippet:?}")]
    Lex { offset: usize, snippet: String },

    /// The tracing subscriber could not be installed.
    #[error("logging setup failed: {message}")]
    Logging { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
