//! UOScript - scripting engine for the UO Steam command language
//!
//! This is the integration layer that connects:
//! - Frontend: line-oriented lexing into an arena AST
//! - Interpreter: scripts, scopes, and lazy typed arguments
//! - Engine: host-registered handlers, stores, and the cooperative driver
//!
//! # Example
//!
//! ```rust
//! use uoscript::{lex, Engine, Script};
//!
//! let mut engine = Engine::new();
//! engine.register_command("msg", |_, _, args, _, _| {
//!     println!("{}", args[0].as_string()?);
//!     Ok(true)
//! });
//!
//! let script = Script::new(lex("msg 'Hello'").unwrap());
//! engine.start_script(script).unwrap();
//! while engine.execute_script().unwrap() {}
//! ```

pub mod argument;
pub mod engine;
pub mod error;
pub mod script;
pub mod value;

pub use argument::Argument;
pub use engine::{
    AliasHandler, CommandHandler, Engine, ExecutionState, ExpressionHandler, TimeoutHandler,
    ALIAS_NONE,
};
pub use error::{Result, RuntimeError, ScriptError};
pub use script::Script;
pub use value::Value;

// Re-export the frontend surface so hosts only need one dependency.
pub use uoscript_frontend::{lex, lex_file, lex_lines, Ast, LexError, NodeId, NodeKind};
