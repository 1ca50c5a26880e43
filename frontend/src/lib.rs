//! UOScript frontend
//!
//! Turns UO Steam script source into an arena-allocated syntax tree:
//! - Line-oriented lexing with quote handling and comment stripping
//! - Statement classification and expression parsing
//! - Doubly-linked sibling navigation for the interpreter's scans

pub mod ast;
pub mod error;
pub mod lexer;

pub use ast::{Ast, NodeId, NodeKind};
pub use error::{LexError, Result};
pub use lexer::{lex, lex_file, lex_lines};
