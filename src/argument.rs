//! Lazy typed arguments
//!
//! An [`Argument`] wraps one AST leaf together with a handle to the owning
//! script's scope stack. Nothing is evaluated until a handler asks for a
//! typed view; at that point the lexeme is first resolved as a lexically
//! scoped variable, so loop variables observe their current binding rather
//! than whatever was on the line at parse time.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::engine::Engine;
use crate::error::{Result, ScriptError};
use crate::script::ScopeStack;
use uoscript_frontend::{Ast, NodeId};

/// One argument of a command or expression invocation.
#[derive(Clone)]
pub struct Argument {
    ast: Rc<Ast>,
    node: NodeId,
    scopes: Weak<RefCell<ScopeStack>>,
}

impl Argument {
    pub(crate) fn new(ast: Rc<Ast>, node: NodeId, scopes: Weak<RefCell<ScopeStack>>) -> Self {
        Self { ast, node, scopes }
    }

    /// The raw lexeme, untouched by scope or alias resolution.
    pub fn lexeme(&self) -> &str {
        self.ast.lexeme(self.node)
    }

    /// The AST leaf this argument wraps.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Follow scope bindings until the lexeme stops resolving. A binding
    /// chain that revisits a name terminates at the last argument instead
    /// of recursing forever.
    fn resolve(&self) -> Argument {
        let mut current = self.clone();
        let mut seen: SmallVec<[String; 4]> = SmallVec::new();

        loop {
            let Some(scopes) = current.scopes.upgrade() else {
                return current;
            };
            let name = current.lexeme().to_string();
            if seen.iter().any(|n| *n == name) {
                return current;
            }
            let next = scopes.borrow().lookup(&name);
            match next {
                Some(bound) => {
                    seen.push(name);
                    current = bound;
                }
                None => return current,
            }
        }
    }

    fn conversion_error(&self, target: &str) -> ScriptError {
        ScriptError::runtime(
            &self.ast,
            self.node,
            format!("cannot convert '{}' to {}", self.lexeme(), target),
        )
    }

    /// Signed integer; `0x`-prefixed lexemes parse as hexadecimal.
    pub fn as_int(&self) -> Result<i32> {
        let target = self.resolve();
        let lexeme = target.lexeme();
        let parsed = match lexeme.strip_prefix("0x") {
            Some(hex) => i32::from_str_radix(hex, 16),
            None => lexeme.parse(),
        };
        parsed.map_err(|_| target.conversion_error("an integer"))
    }

    /// Unsigned integer; `0x`-prefixed lexemes parse as hexadecimal.
    pub fn as_uint(&self) -> Result<u32> {
        let target = self.resolve();
        let lexeme = target.lexeme();
        let parsed = match lexeme.strip_prefix("0x") {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => lexeme.parse(),
        };
        parsed.map_err(|_| target.conversion_error("an unsigned integer"))
    }

    pub fn as_ushort(&self) -> Result<u16> {
        let target = self.resolve();
        let lexeme = target.lexeme();
        let parsed = match lexeme.strip_prefix("0x") {
            Some(hex) => u16::from_str_radix(hex, 16),
            None => lexeme.parse(),
        };
        parsed.map_err(|_| target.conversion_error("an unsigned short"))
    }

    /// Serial resolution order: scoped variable, then engine alias, then a
    /// plain unsigned parse.
    pub fn as_serial(&self, engine: &Engine) -> Result<u32> {
        let target = self.resolve();
        let serial = engine.get_alias(target.lexeme());
        if serial != u32::MAX {
            return Ok(serial);
        }
        target.as_uint()
    }

    /// The lexeme after variable resolution.
    pub fn as_string(&self) -> Result<String> {
        Ok(self.resolve().lexeme().to_string())
    }

    /// Strict `true`/`false` parse. Deliberately skips variable and alias
    /// lookup.
    pub fn as_bool(&self) -> Result<bool> {
        let lexeme = self.lexeme();
        if lexeme.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if lexeme.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(self.conversion_error("a bool"))
        }
    }

    pub fn as_double(&self) -> Result<f64> {
        let target = self.resolve();
        target
            .lexeme()
            .parse()
            .map_err(|_| target.conversion_error("a double"))
    }
}

/// Arguments compare by lexeme; list membership and unique pushes rely on
/// this.
impl PartialEq for Argument {
    fn eq(&self, other: &Self) -> bool {
        self.lexeme() == other.lexeme()
    }
}

impl Eq for Argument {}

impl std::fmt::Debug for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argument")
            .field("node", &self.node)
            .field("lexeme", &self.lexeme())
            .finish()
    }
}
