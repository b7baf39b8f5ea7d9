//! Type tags for values.

use std::fmt;

/// Tag describing which variant a [`Value`](crate::Value) holds.
///
/// Used for type-mismatch diagnostics; the VM never coerces between tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// The empty value.
    None,
    /// 64-bit signed integer.
    Int,
    /// Text.
    String,
    /// Boolean.
    Bool,
    /// Unevaluated expression source.
    Expression,
    /// Base value plus a deferred expression.
    Computed,
}

impl Type {
    /// Returns the lowercase name of this type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Int => "int",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Expression => "expression",
            Self::Computed => "computed",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
