//! Script execution
//!
//! A [`Script`] is a cursor over the statement list of a lexed AST plus a
//! stack of lexical scopes. One call to [`Script::execute_next`] performs
//! exactly one statement or one control-flow unwinding step; the engine
//! drives it cooperatively from its tick loop.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::argument::Argument;
use crate::engine::Engine;
use crate::error::{Result, ScriptError};
use crate::value::{self, Value};
use uoscript_frontend::{Ast, NodeId, NodeKind};

/// One name binding inside a scope.
#[derive(Debug, Clone)]
enum Binding {
    /// A scripted variable (foreach loop variables).
    Value(Argument),
    /// A hidden loop counter, keyed by the loop node's arena index.
    Counter(u32),
}

/// One level of name bindings, anchored to the control-flow node that
/// opened it. Loops use the anchor to tell first entry from re-entry.
#[derive(Debug)]
struct Scope {
    start: NodeId,
    bindings: FxHashMap<String, Binding>,
}

impl Scope {
    fn new(start: NodeId) -> Self {
        Self {
            start,
            bindings: FxHashMap::default(),
        }
    }
}

/// The scope chain of a running script. The root scope is anchored at the
/// first statement and is never popped.
#[derive(Debug)]
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    fn new(start: NodeId) -> Self {
        Self {
            scopes: vec![Scope::new(start)],
        }
    }

    fn push(&mut self, start: NodeId) {
        self.scopes.push(Scope::new(start));
    }

    /// Pop the innermost scope. The root scope stays.
    fn pop(&mut self) -> bool {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            true
        } else {
            false
        }
    }

    fn top_start(&self) -> NodeId {
        self.scopes.last().expect("root scope").start
    }

    fn set(&mut self, name: impl Into<String>, binding: Binding) {
        self.scopes
            .last_mut()
            .expect("root scope")
            .bindings
            .insert(name.into(), binding);
    }

    /// Counter stored in the innermost scope, if any.
    fn counter(&self, name: &str) -> Option<u32> {
        match self.scopes.last().expect("root scope").bindings.get(name) {
            Some(Binding::Counter(n)) => Some(*n),
            _ => None,
        }
    }

    /// Innermost-first variable lookup used by argument coercion.
    pub(crate) fn lookup(&self, name: &str) -> Option<Argument> {
        for scope in self.scopes.iter().rev() {
            if let Some(Binding::Value(arg)) = scope.bindings.get(name) {
                return Some(arg.clone());
            }
        }
        None
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.scopes.len()
    }
}

/// An execution cursor over a lexed script.
pub struct Script {
    ast: Rc<Ast>,
    cursor: Option<NodeId>,
    scopes: Rc<RefCell<ScopeStack>>,
}

impl Script {
    /// Wrap a lexed AST; the cursor starts at the first statement.
    pub fn new(ast: Ast) -> Self {
        let ast = Rc::new(ast);
        let first = ast.first_child(ast.root());
        let anchor = first.unwrap_or_else(|| ast.root());
        Self {
            ast,
            cursor: first,
            scopes: Rc::new(RefCell::new(ScopeStack::new(anchor))),
        }
    }

    /// True once the cursor has run off the end of the script.
    pub fn is_finished(&self) -> bool {
        self.cursor.is_none()
    }

    /// Source line of the statement the cursor is on.
    pub fn current_line(&self) -> Option<usize> {
        self.cursor.map(|stmt| self.ast.line(stmt))
    }

    fn err(&self, node: NodeId, message: impl Into<String>) -> ScriptError {
        ScriptError::runtime(&self.ast, node, message)
    }

    fn argument(&self, node: NodeId) -> Argument {
        Argument::new(self.ast.clone(), node, Rc::downgrade(&self.scopes))
    }

    /// Move to the next statement. A successful advance implicitly clears
    /// any pending timeout.
    fn advance(&mut self, engine: &mut Engine) {
        engine.clear_timeout();
        self.cursor = self.cursor.and_then(|stmt| self.ast.next_sibling(stmt));
    }

    /// Cursor advance without touching engine state; used when a timeout
    /// callback asks to step over a stuck statement.
    pub(crate) fn advance_cursor(&mut self) {
        self.cursor = self.cursor.and_then(|stmt| self.ast.next_sibling(stmt));
    }

    fn push_scope(&mut self, start: NodeId) {
        self.scopes.borrow_mut().push(start);
    }

    fn pop_scope(&mut self, node: NodeId, message: &str) -> Result<()> {
        if self.scopes.borrow_mut().pop() {
            Ok(())
        } else {
            Err(self.err(node, message))
        }
    }

    /// Execute one statement or one control-flow unwinding step. Returns
    /// false once the script has finished.
    pub fn execute_next(&mut self, engine: &mut Engine) -> Result<bool> {
        let Some(stmt) = self.cursor else {
            return Ok(false);
        };
        let node = self
            .ast
            .first_child(stmt)
            .ok_or_else(|| self.err(stmt, "empty statement"))?;

        trace!(line = self.ast.line(stmt), kind = %self.ast.kind(node), "step");

        match self.ast.kind(node) {
            NodeKind::Quiet | NodeKind::Force | NodeKind::Command => {
                self.execute_command(engine, stmt)?
            }
            NodeKind::If => self.execute_if(engine, stmt, node)?,
            // Reached by normal advance: the branch above just finished.
            NodeKind::ElseIf | NodeKind::Else => self.skip_to_endif(stmt, node)?,
            NodeKind::EndIf => {
                self.pop_scope(node, "endif without a matching if")?;
                self.advance(engine);
            }
            NodeKind::While => self.execute_while(engine, stmt, node)?,
            NodeKind::EndWhile => self.rewind_to_while(stmt, node)?,
            NodeKind::For => self.execute_for(engine, stmt, node)?,
            NodeKind::Foreach => self.execute_foreach(engine, stmt, node)?,
            NodeKind::EndFor => self.rewind_to_loop(stmt, node)?,
            NodeKind::Break => self.execute_break(stmt, node)?,
            NodeKind::Continue => self.execute_continue(stmt, node)?,
            NodeKind::Stop => self.cursor = None,
            NodeKind::Replay => self.cursor = self.ast.first_child(self.ast.root()),
            other => {
                return Err(self.err(node, format!("unexpected '{other}' at start of statement")))
            }
        }

        Ok(self.cursor.is_some())
    }

    /// Locate the Command head of a statement, folding in any modifiers.
    fn command_head(&self, stmt: NodeId) -> Result<(NodeId, bool, bool)> {
        let mut quiet = false;
        let mut force = false;
        let mut current = self.ast.first_child(stmt);

        while let Some(node) = current {
            match self.ast.kind(node) {
                NodeKind::Quiet => quiet = true,
                NodeKind::Force => force = true,
                NodeKind::Command => return Ok((node, quiet, force)),
                _ => return Err(self.err(node, "expected a command")),
            }
            current = self.ast.next_sibling(node);
        }

        Err(self.err(stmt, "empty statement"))
    }

    /// Wrap the sibling chain after `head` into arguments, stopping at (but
    /// not consuming) the first logical or comparison operator. Returns the
    /// stopping node, when there is one.
    fn collect_arguments(&self, head: NodeId) -> (SmallVec<[Argument; 4]>, Option<NodeId>) {
        let mut args = SmallVec::new();
        let mut current = self.ast.next_sibling(head);

        while let Some(node) = current {
            if self.ast.kind(node).ends_arguments() {
                return (args, Some(node));
            }
            args.push(self.argument(node));
            current = self.ast.next_sibling(node);
        }

        (args, None)
    }

    fn execute_command(&mut self, engine: &mut Engine, stmt: NodeId) -> Result<()> {
        let (head, quiet, force) = self.command_head(stmt)?;
        let name = self.ast.lexeme(head).to_string();
        let (args, leftover) = self.collect_arguments(head);

        let handler = engine
            .command_handler(&name)
            .ok_or_else(|| self.err(head, format!("unknown command '{name}'")))?;

        debug!(command = %name, args = args.len(), "invoking command");
        let advance = handler(&mut *engine, &name, &args, quiet, force)?;

        if let Some(node) = leftover {
            return Err(self.err(node, "command did not consume all available arguments"));
        }

        // A false return stalls the cursor; the next tick retries.
        if advance {
            self.advance(engine);
        }
        Ok(())
    }

    fn execute_if(&mut self, engine: &mut Engine, stmt: NodeId, node: NodeId) -> Result<()> {
        self.push_scope(node);

        if self.evaluate_condition(engine, node)? {
            self.advance(engine);
            return Ok(());
        }

        // Condition failed: hunt for an elseif/else branch to enter, or
        // land on the matching endif.
        let mut depth = 0usize;
        let mut current = self.ast.next_sibling(stmt);

        while let Some(candidate) = current {
            let head = self
                .ast
                .first_child(candidate)
                .ok_or_else(|| self.err(candidate, "empty statement"))?;

            match self.ast.kind(head) {
                NodeKind::If => depth += 1,
                NodeKind::ElseIf if depth == 0 => {
                    if self.evaluate_condition(engine, head)? {
                        self.cursor = self.ast.next_sibling(candidate);
                        return Ok(());
                    }
                }
                NodeKind::Else if depth == 0 => {
                    self.cursor = self.ast.next_sibling(candidate);
                    return Ok(());
                }
                NodeKind::EndIf => {
                    if depth == 0 {
                        self.cursor = Some(candidate);
                        return Ok(());
                    }
                    depth -= 1;
                }
                _ => {}
            }
            current = self.ast.next_sibling(candidate);
        }

        Err(self.err(node, "if without a matching endif"))
    }

    /// A finished then-branch ran into elseif/else: land on the endif so
    /// the next tick pops the scope.
    fn skip_to_endif(&mut self, stmt: NodeId, node: NodeId) -> Result<()> {
        let mut depth = 0usize;
        let mut current = self.ast.next_sibling(stmt);

        while let Some(candidate) = current {
            let head = self
                .ast
                .first_child(candidate)
                .ok_or_else(|| self.err(candidate, "empty statement"))?;

            match self.ast.kind(head) {
                NodeKind::If => depth += 1,
                NodeKind::EndIf => {
                    if depth == 0 {
                        self.cursor = Some(candidate);
                        return Ok(());
                    }
                    depth -= 1;
                }
                _ => {}
            }
            current = self.ast.next_sibling(candidate);
        }

        Err(self.err(node, "branch without a matching endif"))
    }

    fn execute_while(&mut self, engine: &mut Engine, stmt: NodeId, node: NodeId) -> Result<()> {
        // Only the first entry pushes a scope; looping back from endwhile
        // re-evaluates inside the same scope.
        if self.scopes.borrow().top_start() != node {
            self.push_scope(node);
        }

        if self.evaluate_condition(engine, node)? {
            self.advance(engine);
            return Ok(());
        }

        let mut depth = 0usize;
        let mut current = self.ast.next_sibling(stmt);

        while let Some(candidate) = current {
            let head = self
                .ast
                .first_child(candidate)
                .ok_or_else(|| self.err(candidate, "empty statement"))?;

            match self.ast.kind(head) {
                NodeKind::While => depth += 1,
                NodeKind::EndWhile => {
                    if depth == 0 {
                        self.pop_scope(head, "while scope underflow")?;
                        self.cursor = self.ast.next_sibling(candidate);
                        return Ok(());
                    }
                    depth -= 1;
                }
                _ => {}
            }
            current = self.ast.next_sibling(candidate);
        }

        Err(self.err(node, "while without a matching endwhile"))
    }

    fn rewind_to_while(&mut self, stmt: NodeId, node: NodeId) -> Result<()> {
        let mut depth = 0usize;
        let mut current = self.ast.prev_sibling(stmt);

        while let Some(candidate) = current {
            let head = self
                .ast
                .first_child(candidate)
                .ok_or_else(|| self.err(candidate, "empty statement"))?;

            match self.ast.kind(head) {
                NodeKind::EndWhile => depth += 1,
                NodeKind::While => {
                    if depth == 0 {
                        self.cursor = Some(candidate);
                        return Ok(());
                    }
                    depth -= 1;
                }
                _ => {}
            }
            current = self.ast.prev_sibling(candidate);
        }

        Err(self.err(node, "endwhile without a matching while"))
    }

    fn iterator_name(node: NodeId) -> String {
        format!("%iter{}", node.index())
    }

    fn execute_for(&mut self, engine: &mut Engine, stmt: NodeId, node: NodeId) -> Result<()> {
        let count_node = self
            .ast
            .first_child(node)
            .ok_or_else(|| self.err(node, "for requires a loop count"))?;
        if self.ast.kind(count_node) != NodeKind::Integer {
            return Err(self.err(count_node, "for requires an integer loop count"));
        }
        let limit: i64 = self
            .ast
            .lexeme(count_node)
            .parse()
            .map_err(|_| self.err(count_node, "for requires an integer loop count"))?;

        let name = Self::iterator_name(node);
        let first_entry = self.scopes.borrow().top_start() != node;
        let index = if first_entry {
            self.push_scope(node);
            0
        } else {
            let previous = self.scopes.borrow().counter(&name).unwrap_or(0);
            previous + 1
        };
        self.scopes.borrow_mut().set(name, Binding::Counter(index));

        if i64::from(index) < limit {
            self.advance(engine);
            Ok(())
        } else {
            self.exit_loop(stmt, node)
        }
    }

    fn execute_foreach(&mut self, engine: &mut Engine, stmt: NodeId, node: NodeId) -> Result<()> {
        let var_node = self
            .ast
            .first_child(node)
            .ok_or_else(|| self.err(node, "foreach requires a variable"))?;
        let list_node = self
            .ast
            .next_sibling(var_node)
            .ok_or_else(|| self.err(node, "foreach requires a list"))?;
        let var_name = self.ast.lexeme(var_node).to_string();
        let list_name = self.ast.lexeme(list_node).to_string();

        let name = Self::iterator_name(node);
        let first_entry = self.scopes.borrow().top_start() != node;
        let index = if first_entry {
            self.push_scope(node);
            0
        } else {
            let previous = self.scopes.borrow().counter(&name).unwrap_or(0);
            previous + 1
        };
        self.scopes.borrow_mut().set(name, Binding::Counter(index));

        // A missing or exhausted list leaves the variable unbound and ends
        // the loop.
        match engine.list_element(&list_name, index as usize) {
            Some(element) => {
                self.scopes.borrow_mut().set(var_name, Binding::Value(element));
                self.advance(engine);
                Ok(())
            }
            None => self.exit_loop(stmt, node),
        }
    }

    /// Skip from a for/foreach header to one past the matching endfor,
    /// popping the loop scope.
    fn exit_loop(&mut self, stmt: NodeId, node: NodeId) -> Result<()> {
        let mut depth = 0usize;
        let mut current = self.ast.next_sibling(stmt);

        while let Some(candidate) = current {
            let head = self
                .ast
                .first_child(candidate)
                .ok_or_else(|| self.err(candidate, "empty statement"))?;

            match self.ast.kind(head) {
                NodeKind::For | NodeKind::Foreach => depth += 1,
                NodeKind::EndFor => {
                    if depth == 0 {
                        self.pop_scope(head, "loop scope underflow")?;
                        self.cursor = self.ast.next_sibling(candidate);
                        return Ok(());
                    }
                    depth -= 1;
                }
                _ => {}
            }
            current = self.ast.next_sibling(candidate);
        }

        Err(self.err(node, "loop without a matching endfor"))
    }

    fn rewind_to_loop(&mut self, stmt: NodeId, node: NodeId) -> Result<()> {
        let mut depth = 0usize;
        let mut current = self.ast.prev_sibling(stmt);

        while let Some(candidate) = current {
            let head = self
                .ast
                .first_child(candidate)
                .ok_or_else(|| self.err(candidate, "empty statement"))?;

            match self.ast.kind(head) {
                NodeKind::EndFor => depth += 1,
                NodeKind::For | NodeKind::Foreach => {
                    if depth == 0 {
                        self.cursor = Some(candidate);
                        return Ok(());
                    }
                    depth -= 1;
                }
                _ => {}
            }
            current = self.ast.prev_sibling(candidate);
        }

        Err(self.err(node, "endfor without a matching loop"))
    }

    /// Drop the scopes a break/continue jump abandons: everything opened
    /// inside the loop body (unclosed if chains) sits above the loop's own
    /// scope. With `pop_loop_scope` the loop scope goes too.
    fn unwind_to_loop_scope(&mut self, node: NodeId, pop_loop_scope: bool) -> Result<()> {
        loop {
            let start = self.scopes.borrow().top_start();
            let is_loop = self.ast.kind(start).opens_loop();
            if is_loop && !pop_loop_scope {
                return Ok(());
            }
            if !self.scopes.borrow_mut().pop() {
                return Err(self.err(node, "no enclosing loop scope"));
            }
            if is_loop {
                return Ok(());
            }
        }
    }

    /// Leave the innermost loop: land one past its closer, dropping any
    /// abandoned branch scopes plus the loop's own scope.
    fn execute_break(&mut self, stmt: NodeId, node: NodeId) -> Result<()> {
        let mut depth = 0usize;
        let mut current = self.ast.next_sibling(stmt);

        while let Some(candidate) = current {
            let head = self
                .ast
                .first_child(candidate)
                .ok_or_else(|| self.err(candidate, "empty statement"))?;

            let kind = self.ast.kind(head);
            if kind.opens_loop() {
                depth += 1;
            } else if kind.closes_loop() {
                if depth == 0 {
                    self.unwind_to_loop_scope(node, true)?;
                    self.cursor = self.ast.next_sibling(candidate);
                    return Ok(());
                }
                depth -= 1;
            }
            current = self.ast.next_sibling(candidate);
        }

        Err(self.err(node, "break outside of a loop"))
    }

    /// Transfer control back to the innermost loop header; the next tick
    /// re-evaluates it inside the loop's own scope.
    fn execute_continue(&mut self, stmt: NodeId, node: NodeId) -> Result<()> {
        let mut depth = 0usize;
        let mut current = self.ast.prev_sibling(stmt);

        while let Some(candidate) = current {
            let head = self
                .ast
                .first_child(candidate)
                .ok_or_else(|| self.err(candidate, "empty statement"))?;

            let kind = self.ast.kind(head);
            if kind.closes_loop() {
                depth += 1;
            } else if kind.opens_loop() {
                if depth == 0 {
                    self.unwind_to_loop_scope(node, false)?;
                    self.cursor = Some(candidate);
                    return Ok(());
                }
                depth -= 1;
            }
            current = self.ast.prev_sibling(candidate);
        }

        Err(self.err(node, "continue outside of a loop"))
    }

    /// Evaluate the condition hanging off a control-flow node.
    fn evaluate_condition(&mut self, engine: &mut Engine, control: NodeId) -> Result<bool> {
        let expr = self
            .ast
            .first_child(control)
            .ok_or_else(|| self.err(control, "expression is empty"))?;
        self.evaluate_expression(engine, expr)
    }

    fn evaluate_expression(&mut self, engine: &mut Engine, expr: NodeId) -> Result<bool> {
        match self.ast.kind(expr) {
            NodeKind::UnaryExpression => self.evaluate_unary(engine, expr),
            NodeKind::BinaryExpression => self.evaluate_binary(engine, expr),
            NodeKind::LogicalExpression => self.evaluate_logical(engine, expr),
            _ => Err(self.err(expr, "invalid expression")),
        }
    }

    /// Left-to-right fold over `expr and expr or expr …`. Both sides of
    /// every operator are evaluated; handlers always run for their side
    /// effects.
    fn evaluate_logical(&mut self, engine: &mut Engine, expr: NodeId) -> Result<bool> {
        let mut result: Option<bool> = None;
        let mut pending: Option<NodeKind> = None;

        let mut current = self.ast.first_child(expr);
        while let Some(node) = current {
            match self.ast.kind(node) {
                op @ (NodeKind::And | NodeKind::Or) => pending = Some(op),
                NodeKind::UnaryExpression | NodeKind::BinaryExpression => {
                    let rhs = self.evaluate_expression(engine, node)?;
                    result = Some(match (result, pending.take()) {
                        (None, _) => rhs,
                        (Some(lhs), Some(NodeKind::And)) => lhs && rhs,
                        (Some(lhs), Some(NodeKind::Or)) => lhs || rhs,
                        (Some(_), _) => {
                            return Err(self.err(node, "expected 'and' or 'or'"));
                        }
                    });
                }
                NodeKind::LogicalExpression => {
                    return Err(self.err(node, "logical expressions cannot nest"));
                }
                _ => return Err(self.err(node, "invalid expression")),
            }
            current = self.ast.next_sibling(node);
        }

        result.ok_or_else(|| self.err(expr, "expression is empty"))
    }

    fn evaluate_unary(&mut self, engine: &mut Engine, expr: NodeId) -> Result<bool> {
        let mut negated = false;
        let mut quiet = false;
        let mut current = self.ast.first_child(expr);

        let head = loop {
            let Some(node) = current else {
                return Err(self.err(expr, "expression is empty"));
            };
            match self.ast.kind(node) {
                NodeKind::Not => negated = true,
                NodeKind::Quiet => quiet = true,
                NodeKind::Force => {}
                NodeKind::Operand => break node,
                _ => return Err(self.err(node, "invalid expression")),
            }
            current = self.ast.next_sibling(node);
        };

        let name = self.ast.lexeme(head).to_string();
        let (args, _) = self.collect_arguments(head);

        let handler = engine
            .expression_handler(&name)
            .ok_or_else(|| self.err(head, format!("unknown expression '{name}'")))?;

        debug!(expression = %name, "invoking expression");
        let result = handler(engine, &name, &args, quiet)?;

        let expected = Value::Bool(!negated);
        value::compare(NodeKind::Equal, &result, &expected)
            .map_err(|e| self.err(head, e.to_string()))
    }

    fn evaluate_binary(&mut self, engine: &mut Engine, expr: NodeId) -> Result<bool> {
        let (lhs, after_lhs) = self.evaluate_operand(engine, expr, self.ast.first_child(expr))?;

        let op_node = after_lhs.ok_or_else(|| self.err(expr, "expression is missing an operator"))?;
        let op = self.ast.kind(op_node);
        if !op.is_comparison() {
            return Err(self.err(op_node, "expected a comparison operator"));
        }

        let (rhs, _) = self.evaluate_operand(engine, expr, self.ast.next_sibling(op_node))?;

        value::compare(op, &lhs, &rhs).map_err(|e| self.err(op_node, e.to_string()))
    }

    /// Evaluate one side of a binary expression to a comparable value and
    /// return the first unconsumed sibling.
    fn evaluate_operand(
        &mut self,
        engine: &mut Engine,
        expr: NodeId,
        start: Option<NodeId>,
    ) -> Result<(Value, Option<NodeId>)> {
        let mut quiet = false;
        let mut current = start;

        let node = loop {
            let Some(node) = current else {
                return Err(self.err(expr, "expression is missing an operand"));
            };
            match self.ast.kind(node) {
                NodeKind::Quiet => quiet = true,
                NodeKind::Force => {}
                _ => break node,
            }
            current = self.ast.next_sibling(node);
        };

        let lexeme = self.ast.lexeme(node);
        let next = self.ast.next_sibling(node);

        let value = match self.ast.kind(node) {
            NodeKind::Integer => Value::Int(
                lexeme
                    .parse()
                    .map_err(|_| self.err(node, format!("invalid integer '{lexeme}'")))?,
            ),
            NodeKind::Serial => {
                let parsed = match lexeme.strip_prefix("0x") {
                    Some(hex) => u32::from_str_radix(hex, 16),
                    None => lexeme.parse(),
                };
                Value::UInt(parsed.map_err(|_| self.err(node, format!("invalid serial '{lexeme}'")))?)
            }
            NodeKind::Double => Value::Double(
                lexeme
                    .parse()
                    .map_err(|_| self.err(node, format!("invalid double '{lexeme}'")))?,
            ),
            NodeKind::StringLit => Value::Str(lexeme.to_string()),
            NodeKind::Operand => {
                // A registered expression, or a bare literal when nothing
                // answers to the name.
                match engine.expression_handler(lexeme) {
                    Some(handler) => {
                        let name = lexeme.to_string();
                        let (args, stop) = self.collect_arguments(node);
                        debug!(expression = %name, "invoking expression");
                        let result = handler(engine, &name, &args, quiet)?;
                        return Ok((result, stop));
                    }
                    None => Value::Str(lexeme.to_string()),
                }
            }
            _ => return Err(self.err(node, "invalid operand")),
        };

        Ok((value, next))
    }

    #[cfg(test)]
    pub(crate) fn arguments_of_first_command(&self) -> Vec<Argument> {
        let stmt = self.ast.first_child(self.ast.root()).expect("statement");
        let (head, _, _) = self.command_head(stmt).expect("command");
        self.collect_arguments(head).0.to_vec()
    }
}

impl std::fmt::Debug for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Script")
            .field("cursor", &self.cursor)
            .field("finished", &self.is_finished())
            .finish()
    }
}
