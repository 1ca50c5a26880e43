//! Comparable values produced by expressions
//!
//! Expression handlers return a [`Value`]; binary conditions compare two
//! of them with [`compare`]. The comparator's type-juggling rule is
//! deliberately asymmetric and must stay exactly as implemented here:
//! same kind compares directly; otherwise a double on the right promotes
//! the left side, a bool on the right coerces the left side, and any
//! other mismatch coerces the right side to the left side's kind.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;
use uoscript_frontend::NodeKind;

/// Raised when a comparison needs a coercion the operand cannot satisfy.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct CoercionError(String);

type CoerceResult<T> = std::result::Result<T, CoercionError>;

/// A typed comparable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Double(f64),
    Str(String),
}

impl Value {
    fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::UInt(_) => "unsigned integer",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
        }
    }

    fn cannot_convert(&self, target: &str) -> CoercionError {
        CoercionError(format!("cannot convert {} '{}' to {}", self.kind_name(), self, target))
    }

    pub fn to_bool(&self) -> CoerceResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            Value::UInt(u) => Ok(*u != 0),
            Value::Double(d) => Ok(*d != 0.0),
            Value::Str(s) => match s.to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(self.cannot_convert("bool")),
            },
        }
    }

    pub fn to_int(&self) -> CoerceResult<i32> {
        match self {
            Value::Bool(b) => Ok(i32::from(*b)),
            Value::Int(i) => Ok(*i),
            Value::UInt(u) => i32::try_from(*u).map_err(|_| self.cannot_convert("integer")),
            Value::Double(d) => Ok(*d as i32),
            Value::Str(s) => s.parse().map_err(|_| self.cannot_convert("integer")),
        }
    }

    pub fn to_uint(&self) -> CoerceResult<u32> {
        match self {
            Value::Bool(b) => Ok(u32::from(*b)),
            Value::Int(i) => u32::try_from(*i).map_err(|_| self.cannot_convert("unsigned integer")),
            Value::UInt(u) => Ok(*u),
            Value::Double(d) => Ok(*d as u32),
            Value::Str(s) => s.parse().map_err(|_| self.cannot_convert("unsigned integer")),
        }
    }

    pub fn to_double(&self) -> CoerceResult<f64> {
        match self {
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Ok(f64::from(*i)),
            Value::UInt(u) => Ok(f64::from(*u)),
            Value::Double(d) => Ok(*d),
            Value::Str(s) => s.parse().map_err(|_| self.cannot_convert("double")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::UInt(u) => write!(f, "{}", u),
            Value::Double(d) => write!(f, "{}", d),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::UInt(u32::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

fn double_cmp(lhs: f64, rhs: f64) -> CoerceResult<Ordering> {
    lhs.partial_cmp(&rhs)
        .ok_or_else(|| CoercionError("cannot order NaN".to_string()))
}

/// Evaluate `lhs op rhs` with the asymmetric coercion rule.
pub fn compare(op: NodeKind, lhs: &Value, rhs: &Value) -> CoerceResult<bool> {
    let ordering = match (lhs, rhs) {
        // Same kind: compare directly.
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::UInt(a), Value::UInt(b)) => a.cmp(b),
        (Value::Double(a), Value::Double(b)) => double_cmp(*a, *b)?,
        (Value::Str(a), Value::Str(b)) => a.cmp(b),

        // Right side is a double: promote the left side.
        (_, Value::Double(b)) => double_cmp(lhs.to_double()?, *b)?,

        // Right side is a bool: coerce the left side.
        (_, Value::Bool(b)) => lhs.to_bool()?.cmp(b),

        // Everything else: coerce the right side to the left side's kind.
        (Value::Bool(a), _) => a.cmp(&rhs.to_bool()?),
        (Value::Int(a), _) => a.cmp(&rhs.to_int()?),
        (Value::UInt(a), _) => a.cmp(&rhs.to_uint()?),
        (Value::Double(a), _) => double_cmp(*a, rhs.to_double()?)?,
        (Value::Str(a), _) => a.cmp(&rhs.to_string()),
    };

    apply(op, ordering)
}

fn apply(op: NodeKind, ordering: Ordering) -> CoerceResult<bool> {
    let result = match op {
        NodeKind::Equal => ordering == Ordering::Equal,
        NodeKind::NotEqual => ordering != Ordering::Equal,
        NodeKind::LessThan => ordering == Ordering::Less,
        NodeKind::LessThanOrEqual => ordering != Ordering::Greater,
        NodeKind::GreaterThan => ordering == Ordering::Greater,
        NodeKind::GreaterThanOrEqual => ordering != Ordering::Less,
        _ => return Err(CoercionError(format!("'{op}' is not a comparison operator"))),
    };
    Ok(result)
}
