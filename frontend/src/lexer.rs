//! Lexer for UOScript source
//!
//! The language is line oriented: every non-empty, non-comment line becomes
//! exactly one Statement under the root Script node. Lexing and parsing
//! happen in a single pass per line; there is no separate token stream.

use std::path::Path;

use smallvec::SmallVec;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::error::{LexError, Result};

/// Lexemes of one source line. Lines are short, so spill rarely.
type Lexemes = SmallVec<[String; 8]>;

/// Lex a complete source text into an AST.
pub fn lex(source: &str) -> Result<Ast> {
    let lines: Vec<&str> = source.lines().collect();
    lex_lines(&lines)
}

/// Lex a sequence of source lines into an AST.
pub fn lex_lines<S: AsRef<str>>(lines: &[S]) -> Result<Ast> {
    let mut ast = Ast::new();
    let root = ast.root();

    for (i, line) in lines.iter().enumerate() {
        parse_line(&mut ast, root, line.as_ref(), i + 1)?;
    }

    Ok(ast)
}

/// Read `path` and lex its contents.
pub fn lex_file(path: &Path) -> Result<Ast> {
    let source = std::fs::read_to_string(path).map_err(|source| LexError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    lex(&source)
}

fn parse_line(ast: &mut Ast, root: NodeId, line: &str, line_no: usize) -> Result<()> {
    let line = line.trim();

    if line.starts_with("//") || line.starts_with('#') {
        return Ok(());
    }

    let lexemes = tokenize(line);
    if lexemes.is_empty() {
        return Ok(());
    }

    parse_statement(ast, root, &lexemes, line_no)
}

/// Split a line into lexemes. Both quote characters delimit atomic
/// segments and may close each other; everything outside quotes is split
/// on runs of whitespace.
fn tokenize(line: &str) -> Lexemes {
    let mut lexemes = Lexemes::new();

    for (i, segment) in line.split(['\'', '"']).enumerate() {
        if i % 2 == 0 {
            for token in segment.split_whitespace() {
                lexemes.push(token.to_string());
            }
        } else {
            // Inside quotes: one lexeme, whitespace preserved.
            lexemes.push(segment.to_string());
        }
    }

    lexemes
}

fn parse_statement(ast: &mut Ast, root: NodeId, lexemes: &[String], line: usize) -> Result<()> {
    let statement = ast.push(root, NodeKind::Statement, "", line);
    let head = lexemes[0].as_str();
    let rest = &lexemes[1..];

    match head {
        "if" => {
            let node = ast.push(statement, NodeKind::If, "", line);
            require_condition(head, rest, line)?;
            parse_logical_expression(ast, node, rest, line)?;
        }
        "elseif" => {
            let node = ast.push(statement, NodeKind::ElseIf, "", line);
            require_condition(head, rest, line)?;
            parse_logical_expression(ast, node, rest, line)?;
        }
        "while" => {
            let node = ast.push(statement, NodeKind::While, "", line);
            require_condition(head, rest, line)?;
            parse_logical_expression(ast, node, rest, line)?;
        }
        "for" => {
            let node = ast.push(statement, NodeKind::For, "", line);
            if rest.is_empty() {
                return Err(LexError::syntax(line, "for requires a loop count"));
            }
            for lexeme in rest {
                parse_value(ast, node, lexeme, NodeKind::StringLit, line);
            }
        }
        "foreach" => {
            let node = ast.push(statement, NodeKind::Foreach, "", line);
            if rest.len() != 3 || rest[1] != "in" {
                return Err(LexError::syntax(line, "expected 'foreach VAR in LIST'"));
            }
            parse_value(ast, node, &rest[0], NodeKind::StringLit, line);
            parse_value(ast, node, &rest[2], NodeKind::StringLit, line);
        }
        "else" => parse_marker(ast, statement, NodeKind::Else, head, rest, line)?,
        "endif" => parse_marker(ast, statement, NodeKind::EndIf, head, rest, line)?,
        "endwhile" => parse_marker(ast, statement, NodeKind::EndWhile, head, rest, line)?,
        "endfor" => parse_marker(ast, statement, NodeKind::EndFor, head, rest, line)?,
        "break" => parse_marker(ast, statement, NodeKind::Break, head, rest, line)?,
        "continue" => parse_marker(ast, statement, NodeKind::Continue, head, rest, line)?,
        "stop" => parse_marker(ast, statement, NodeKind::Stop, head, rest, line)?,
        "replay" => parse_marker(ast, statement, NodeKind::Replay, head, rest, line)?,
        _ => {
            // Anything else is a command invocation.
            parse_command_head(ast, statement, NodeKind::Command, head, line);
            for lexeme in rest {
                parse_value(ast, statement, lexeme, NodeKind::StringLit, line);
            }
        }
    }

    Ok(())
}

fn require_condition(keyword: &str, rest: &[String], line: usize) -> Result<()> {
    if rest.is_empty() {
        return Err(LexError::syntax(
            line,
            format!("{keyword} requires an expression"),
        ));
    }
    Ok(())
}

/// Zero-argument statement heads: else, endif, break, and friends.
fn parse_marker(
    ast: &mut Ast,
    statement: NodeId,
    kind: NodeKind,
    keyword: &str,
    rest: &[String],
    line: usize,
) -> Result<()> {
    if !rest.is_empty() {
        return Err(LexError::syntax(
            line,
            format!("{keyword} does not take arguments"),
        ));
    }
    ast.push(statement, kind, "", line);
    Ok(())
}

/// Strip `@` / `!` modifiers off a command or operand head and emit the
/// marker nodes, then the head node itself.
fn parse_command_head(
    ast: &mut Ast,
    parent: NodeId,
    kind: NodeKind,
    lexeme: &str,
    line: usize,
) -> NodeId {
    let mut name = lexeme;

    if let Some(stripped) = name.strip_prefix('@') {
        ast.push(parent, NodeKind::Quiet, "", line);
        name = stripped;
    }

    if let Some(stripped) = name.strip_suffix('!') {
        ast.push(parent, NodeKind::Force, "", line);
        name = stripped;
    }

    ast.push(parent, kind, name, line)
}

/// Classify a value token. `0x`-prefixed tokens are serials, tokens that
/// parse as a signed decimal integer are integers, everything else takes
/// the caller's default kind.
fn parse_value(ast: &mut Ast, parent: NodeId, lexeme: &str, default: NodeKind, line: usize) {
    let kind = if lexeme.starts_with("0x") {
        NodeKind::Serial
    } else if lexeme.parse::<i32>().is_ok() {
        NodeKind::Integer
    } else {
        default
    };
    ast.push(parent, kind, lexeme, line);
}

fn operator_kind(lexeme: &str) -> Option<NodeKind> {
    match lexeme {
        "==" | "=" => Some(NodeKind::Equal),
        "!=" => Some(NodeKind::NotEqual),
        "<" => Some(NodeKind::LessThan),
        "<=" => Some(NodeKind::LessThanOrEqual),
        ">" => Some(NodeKind::GreaterThan),
        ">=" => Some(NodeKind::GreaterThanOrEqual),
        _ => None,
    }
}

/// Parse a condition, joining sub-expressions with `and` / `or` when they
/// appear at the top level. There is no grouping.
fn parse_logical_expression(
    ast: &mut Ast,
    parent: NodeId,
    lexemes: &[String],
    line: usize,
) -> Result<()> {
    let logical = lexemes.iter().any(|l| l == "and" || l == "or");
    if !logical {
        return parse_expression(ast, parent, lexemes, line);
    }

    let expr = ast.push(parent, NodeKind::LogicalExpression, "", line);
    let mut start = 0;

    for (i, lexeme) in lexemes.iter().enumerate() {
        let op = match lexeme.as_str() {
            "and" => NodeKind::And,
            "or" => NodeKind::Or,
            _ => continue,
        };
        parse_expression(ast, expr, &lexemes[start..i], line)?;
        ast.push(expr, op, "", line);
        start = i + 1;
    }

    parse_expression(ast, expr, &lexemes[start..], line)
}

/// Classify one sub-expression as unary or binary and parse it.
fn parse_expression(ast: &mut Ast, parent: NodeId, lexemes: &[String], line: usize) -> Result<()> {
    if lexemes.is_empty() {
        return Err(LexError::syntax(line, "empty expression"));
    }

    // `not` only appears in unary expressions, comparison operators only
    // in binary ones.
    let unary = lexemes.iter().any(|l| l == "not");
    let binary = lexemes.iter().any(|l| operator_kind(l).is_some());

    if unary && binary {
        return Err(LexError::syntax(
            line,
            "'not' cannot be combined with a comparison operator",
        ));
    }

    if binary {
        parse_binary_expression(ast, parent, lexemes, line)
    } else {
        parse_unary_expression(ast, parent, lexemes, line)
    }
}

fn parse_unary_expression(
    ast: &mut Ast,
    parent: NodeId,
    lexemes: &[String],
    line: usize,
) -> Result<()> {
    let expr = ast.push(parent, NodeKind::UnaryExpression, "", line);
    let mut i = 0;

    if lexemes[i] == "not" {
        ast.push(expr, NodeKind::Not, "", line);
        i += 1;
        if i >= lexemes.len() {
            return Err(LexError::syntax(line, "empty expression"));
        }
    }

    parse_command_head(ast, expr, NodeKind::Operand, &lexemes[i], line);
    for lexeme in &lexemes[i + 1..] {
        parse_value(ast, expr, lexeme, NodeKind::StringLit, line);
    }

    Ok(())
}

fn parse_binary_expression(
    ast: &mut Ast,
    parent: NodeId,
    lexemes: &[String],
    line: usize,
) -> Result<()> {
    let expr = ast.push(parent, NodeKind::BinaryExpression, "", line);
    let mut i = 0;

    parse_binary_operand(ast, expr, lexemes, &mut i, line);

    let Some(op) = lexemes.get(i).and_then(|l| operator_kind(l)) else {
        return Err(LexError::syntax(line, "expected a comparison operator"));
    };
    ast.push(expr, op, "", line);
    i += 1;

    if i >= lexemes.len() {
        return Err(LexError::syntax(line, "expected a right-hand operand"));
    }
    parse_binary_operand(ast, expr, lexemes, &mut i, line);

    if i < lexemes.len() {
        return Err(LexError::syntax(line, "unexpected token after expression"));
    }

    Ok(())
}

/// One side of a binary expression: an explicit integer literal, or an
/// operand head followed by its argument values up to the next operator.
fn parse_binary_operand(
    ast: &mut Ast,
    expr: NodeId,
    lexemes: &[String],
    i: &mut usize,
    line: usize,
) {
    if lexemes[*i].parse::<i32>().is_ok() {
        parse_value(ast, expr, &lexemes[*i], NodeKind::StringLit, line);
        *i += 1;
        return;
    }

    parse_command_head(ast, expr, NodeKind::Operand, &lexemes[*i], line);
    *i += 1;
    while *i < lexemes.len() && operator_kind(&lexemes[*i]).is_none() {
        parse_value(ast, expr, &lexemes[*i], NodeKind::StringLit, line);
        *i += 1;
    }
}
