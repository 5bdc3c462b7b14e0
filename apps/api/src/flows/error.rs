use thiserror::Error;

use crate::flows::validation::ValidationError;
use crate::flows::ReadingKind;
use crate::llm_client::LlmError;

/// Outcomes of a model invocation that did not produce a usable reading.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("The AI returned an empty response. Please try again later.")]
    EmptyOutput,

    /// The model looked at the input and declined, e.g. an unreadable palm photo.
    #[error("{0}")]
    ModelReportedError(String),

    #[error("The AI generated an incomplete or empty {0}. Please try again.")]
    IncompleteOutput(ReadingKind),

    #[error("model transport failed: {0}")]
    Transport(#[from] LlmError),

    /// A translation whose structure differs from the original at the given path.
    #[error("translated object does not match the original at {0}")]
    ShapeMismatch(String),
}

/// Everything `flows::invoke` can fail with.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl From<LlmError> for FlowError {
    fn from(e: LlmError) -> Self {
        FlowError::Generation(GenerationError::Transport(e))
    }
}
