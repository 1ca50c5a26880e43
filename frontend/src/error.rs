//! Error types for the UOScript frontend

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LexError>;

#[derive(Error, Debug)]
pub enum LexError {
    #[error("Syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("I/O error for file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LexError {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        LexError::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Source line the error was raised on, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            LexError::Syntax { line, .. } => Some(*line),
            LexError::Io { .. } => None,
        }
    }
}
