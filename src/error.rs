use thiserror::Error;

use crate::visitors::validation::ValidationResult;

pub type Result<T> = std::result::Result<T, QueryError>;

/// Syntax error from the reference grammar. `position` is a character offset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at position {position})")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A pass was run on input it cannot handle (configuration mistake).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("no {0} resolver configured")]
    MissingResolver(&'static str),

    #[error("pass {0} is not part of the pipeline")]
    PassNotFound(&'static str),

    #[error("invalid query: {}", .0.message.as_deref().unwrap_or("validation failed"))]
    Validation(Box<ValidationResult>),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
