//! Core value type for dice expressions and stored attributes.

use std::fmt;

use crate::types::Type;

/// A value on the VM stack or in a variable tier.
///
/// Values are plain owned data: assigning a value copies it, nothing is
/// shared mutably between the stack and the backing stores.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Value {
    /// Absence of a value.
    #[default]
    None,
    /// 64-bit signed integer.
    Int(i64),
    /// Text.
    String(String),
    /// Boolean.
    Bool(bool),
    /// Unevaluated expression source.
    Expression(String),
    /// Lazily recomputed derived attribute.
    Computed(ComputedValue),
}

/// A base value paired with an expression re-evaluated on every read.
///
/// When read, the base is exposed to the expression as `$tVal`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComputedValue {
    /// The stored base value.
    pub base: Box<Value>,
    /// Expression source evaluated on read.
    pub expr: String,
}

impl ComputedValue {
    /// Creates a computed value.
    #[must_use]
    pub fn new(base: Value, expr: impl Into<String>) -> Self {
        Self {
            base: Box::new(base),
            expr: expr.into(),
        }
    }
}

impl Value {
    /// Returns the type tag of this value.
    #[must_use]
    pub const fn value_type(&self) -> Type {
        match self {
            Self::None => Type::None,
            Self::Int(_) => Type::Int,
            Self::String(_) => Type::String,
            Self::Bool(_) => Type::Bool,
            Self::Expression(_) => Type::Expression,
            Self::Computed(_) => Type::Computed,
        }
    }

    /// Returns true if this value is [`Value::None`].
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Attempts to extract an integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Int(n) => write!(f, "{n}"),
            Self::String(s) | Self::Expression(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Computed(c) => write!(f, "&({})", c.expr),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<ComputedValue> for Value {
    fn from(c: ComputedValue) -> Self {
        Self::Computed(c)
    }
}
