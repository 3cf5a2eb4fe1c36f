use thiserror::Error;

/// Errors from the probability engine.
///
/// Missing or sparse data never errors; it yields a zero result instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtremesError {
    #[error("Unknown condition: {0}")]
    UnknownCondition(String),
}
