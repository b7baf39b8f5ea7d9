//! Token types for dice expressions.

use crate::span::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this token can begin an operand.
    #[must_use]
    pub const fn starts_operand(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Int(_)
                | TokenKind::Ident(_)
                | TokenKind::Str(_)
                | TokenKind::FormatStr(_)
                | TokenKind::LParen
        )
    }
}

/// Token types for dice expressions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    /// Non-negative decimal integer.
    Int(i64),
    /// Variable name.
    Ident(String),
    /// `"..."` with escapes resolved.
    Str(String),
    /// `` `...` `` raw text, placeholders still in place.
    FormatStr(String),

    // Operators
    /// `d` or `D` standing on its own.
    Dice,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `^` or `**`
    Caret,
    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `*=`
    StarAssign,
    /// `/=`
    SlashAssign,

    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,

    /// End of input.
    Eof,
    /// Lexical error.
    Error(String),
}

impl TokenKind {
    /// Short human-readable name used in diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Ident(name) => format!("`{name}`"),
            Self::Str(_) => "string".to_string(),
            Self::FormatStr(_) => "format string".to_string(),
            Self::Dice => "`d`".to_string(),
            Self::Plus => "`+`".to_string(),
            Self::Minus => "`-`".to_string(),
            Self::Star => "`*`".to_string(),
            Self::Slash => "`/`".to_string(),
            Self::Percent => "`%`".to_string(),
            Self::Caret => "`^`".to_string(),
            Self::Assign => "`=`".to_string(),
            Self::PlusAssign => "`+=`".to_string(),
            Self::MinusAssign => "`-=`".to_string(),
            Self::StarAssign => "`*=`".to_string(),
            Self::SlashAssign => "`/=`".to_string(),
            Self::LParen => "`(`".to_string(),
            Self::RParen => "`)`".to_string(),
            Self::Eof => "end of input".to_string(),
            Self::Error(msg) => msg.clone(),
        }
    }
}
