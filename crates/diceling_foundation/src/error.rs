//! Error types for the Diceling system.
//!
//! Uses `thiserror` for ergonomic error definition. User-facing kinds carry
//! a short `E<n>:` code so chat replies can be matched against the code
//! regardless of how the surrounding message is worded.

use std::fmt;

use thiserror::Error;

use crate::types::Type;

/// Convenience alias used across all Diceling crates.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Diceling operations.
#[derive(Clone, Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates the sticky program-overflow error.
    #[must_use]
    pub fn program_overflow(capacity: usize) -> Self {
        Self::new(ErrorKind::ProgramOverflow { capacity })
    }

    /// Creates an expression syntax error.
    #[must_use]
    pub fn parse(message: impl Into<String>, offset: usize) -> Self {
        Self::new(ErrorKind::Parse {
            message: message.into(),
            offset,
        })
    }

    /// Creates a type mismatch error for an operator.
    #[must_use]
    pub fn type_mismatch(op: &'static str, expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            op,
            expected,
            actual,
        })
    }

    /// Creates a division-by-zero error for `/` or `%`.
    #[must_use]
    pub fn division_by_zero(op: &'static str) -> Self {
        Self::new(ErrorKind::DivisionByZero { op })
    }

    /// Creates an evaluation limit error.
    #[must_use]
    pub fn limit_exceeded(limit: EvalLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Returns the short user-facing code (`"E1"`, `"E2"`, ...) of this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ErrorKind {
    /// The compiled program ran out of instruction slots.
    #[error("E1: expression too extreme, instruction capacity of {capacity} exceeded")]
    ProgramOverflow {
        /// Fixed capacity of the program.
        capacity: usize,
    },

    /// The expression text could not be parsed.
    #[error("E2: invalid expression at byte {offset}: {message}")]
    Parse {
        /// Description of the problem.
        message: String,
        /// Byte offset into the expression source.
        offset: usize,
    },

    /// An instruction found fewer operands than it needs.
    #[error("E3: malformed program, stack underflow at `{instruction}`")]
    StackUnderflow {
        /// Mnemonic of the failing instruction.
        instruction: String,
    },

    /// An operator received an operand of the wrong type.
    #[error("E4: `{op}` expects {expected}, got {actual}")]
    TypeMismatch {
        /// Operator symbol.
        op: &'static str,
        /// The expected type.
        expected: Type,
        /// The actual type encountered.
        actual: Type,
    },

    /// Division or modulus by zero.
    #[error("E4: `{op}` by zero")]
    DivisionByZero {
        /// Operator symbol.
        op: &'static str,
    },

    /// Checked 64-bit arithmetic overflowed.
    #[error("E4: `{op}` overflowed a 64-bit integer")]
    ArithmeticOverflow {
        /// Operator symbol.
        op: &'static str,
    },

    /// An evaluation limit was hit.
    #[error("E5: {0}")]
    LimitExceeded(EvalLimit),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns the short user-facing code of this kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ProgramOverflow { .. } => "E1",
            Self::Parse { .. } => "E2",
            Self::StackUnderflow { .. } => "E3",
            Self::TypeMismatch { .. }
            | Self::DivisionByZero { .. }
            | Self::ArithmeticOverflow { .. } => "E4",
            Self::LimitExceeded(_) => "E5",
            Self::Internal(_) => "E0",
        }
    }
}

/// Evaluation limits that can be exceeded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalLimit {
    /// Too many individual dice rolled in one evaluation.
    DiceBudget {
        /// The configured budget.
        limit: u64,
    },
    /// Computed values or templates nested too deeply.
    RecursionDepth {
        /// The configured depth.
        limit: u32,
    },
}

impl fmt::Display for EvalLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiceBudget { limit } => write!(f, "more than {limit} dice in one roll"),
            Self::RecursionDepth { limit } => {
                write!(f, "computed values nested deeper than {limit}")
            }
        }
    }
}

/// Context about where an error occurred.
#[derive(Clone, Debug, Default)]
pub struct ErrorContext {
    /// Expression source being evaluated.
    pub source: Option<String>,
    /// Chain of computed variables being expanded, outermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the expression source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "in `{source}`")?;
        }
        for frame in &self.stack {
            write!(f, "\n  via {frame}")?;
        }
        Ok(())
    }
}
