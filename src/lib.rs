//! Diceling - chat-command front end and dice-expression VM
//!
//! This crate re-exports all layers of the Diceling system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: diceling_runtime    - Variable tiers, sessions, console
//! Layer 1: diceling_language   - Expression lexer, compiler, bytecode VM
//!          diceling_parser     - Mentions, micro-codes, command tokenizer
//! Layer 0: diceling_foundation - Core types (Value, Type, Error)
//! ```

pub use diceling_foundation as foundation;
pub use diceling_language as language;
pub use diceling_parser as parser;
pub use diceling_runtime as runtime;
