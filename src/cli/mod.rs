//! CLI support for lucene-query
//!
//! The `lq` commands are plain functions over option structs so they can be
//! embedded in other tools without going through argument parsing.

mod check;
mod config;
mod format;
mod invert;

pub use check::{CheckOptions, CheckOutput, execute_check};
pub use config::{load_aliases, load_field_map, load_includes, load_policy};
pub use format::execute_format;
pub use invert::{InvertOptions, execute_invert};

use std::{io, path::PathBuf};

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Parsing or pipeline error
    Query(crate::QueryError),
    /// JSON parsing error in a configuration file
    Json(PathBuf, serde_json::Error),
    /// IO error
    Io(io::Error),
    /// No query provided
    NoInput,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Query(e) => write!(f, "{}", e),
            CliError::Json(path, e) => write!(f, "Invalid JSON in {}: {}", path.display(), e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => write!(f, "No query provided. Pass it as an argument or pipe it to stdin."),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Query(e) => Some(e),
            CliError::Json(_, e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::NoInput => None,
        }
    }
}

impl From<crate::QueryError> for CliError {
    fn from(e: crate::QueryError) -> Self {
        CliError::Query(e)
    }
}

impl From<crate::ParseError> for CliError {
    fn from(e: crate::ParseError) -> Self {
        CliError::Query(e.into())
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
