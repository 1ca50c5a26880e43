//! Error types for the UOScript engine

use std::fmt;

use thiserror::Error;
use uoscript_frontend::{Ast, LexError, NodeId};

/// Result type for engine and interpreter operations
pub type Result<T> = std::result::Result<T, ScriptError>;

/// The single runtime error kind: an offending AST node (when there is
/// one) plus a human-readable message. Raising one aborts the active
/// script; engine stores survive.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub node: Option<NodeId>,
    pub line: Option<usize>,
    pub message: String,
}

impl RuntimeError {
    /// Error raised at a specific AST node; captures the node's source line.
    pub fn at(ast: &Ast, node: NodeId, message: impl Into<String>) -> Self {
        Self {
            node: Some(node),
            line: Some(ast.line(node)),
            message: message.into(),
        }
    }

    /// Error with no originating node (host-driven store operations).
    pub fn detached(message: impl Into<String>) -> Self {
        Self {
            node: None,
            line: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Engine error types
#[derive(Error, Debug)]
pub enum ScriptError {
    /// Script aborted at run time
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Source failed to lex
    #[error("Parse error: {0}")]
    Parse(#[from] LexError),
}

impl ScriptError {
    pub fn runtime(ast: &Ast, node: NodeId, message: impl Into<String>) -> Self {
        ScriptError::Runtime(RuntimeError::at(ast, node, message))
    }

    pub fn detached(message: impl Into<String>) -> Self {
        ScriptError::Runtime(RuntimeError::detached(message))
    }
}
