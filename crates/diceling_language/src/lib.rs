//! Dice-expression lexer, bytecode compiler, and stack VM for Diceling.
//!
//! This crate provides:
//! - `Lexer` - Tokenization of dice expressions
//! - `Compiler` - Single-pass compilation into a fixed-capacity program
//! - `Vm` - Stack-based evaluation with calculation traces
//! - `DiceSource` - Pluggable randomness for rolls

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod compiler;
pub mod dice;
pub mod lexer;
pub mod opcode;
pub mod span;
pub mod token;
pub mod vm;


pub use compiler::{Compiler, DEFAULT_DICE_SIDES, MAX_NESTING};
pub use dice::{DiceSource, RngDice, ScriptedDice};
pub use lexer::Lexer;
pub use opcode::{CompiledProgram, DEFAULT_CAPACITY, Instruction};
pub use span::Span;
pub use token::{Token, TokenKind};
pub use vm::{
    COMPUTED_BASE_VAR, EvalOptions, Evaluation, MapContext, VariableContext, Vm, eval,
};

use diceling_foundation::Result;

/// Compiles an expression with default settings.
///
/// # Errors
///
/// Returns an `E2` error if the source is not a well-formed expression.
pub fn compile(source: &str) -> Result<CompiledProgram> {
    Compiler::new().compile(source)
}
