//! Chat command front end for Diceling.
//!
//! Turns one raw chat line into a structured [`CommandInvocation`].
//!
//! # Architecture
//!
//! ```text
//! "[CQ:at,qq=1] .3#r 1d20+5 --asm"
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ MICRO-CODES     │  → drop [CQ:reply,...] quote markers
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ MENTIONS        │  → ".3#r 1d20+5 --asm", [QQ:1]
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ TOKENIZER       │  → r ×3, args ["1d20+5"], kwargs [--asm]
//! └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`microcode`] - `[CQ:...]` and `[img:...]` scanning and rewriting
//! - [`mention`] - Per-platform mention patterns
//! - [`tokenizer`] - Prefix, repeat-marker and keyword matching
//! - [`command`] - The invocation type and its argument helpers

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod command;
pub mod mention;
pub mod microcode;
pub mod tokenizer;


pub use command::{CommandInvocation, KeywordArgument};
pub use mention::{Mention, extract_mentions, mention_pattern};
pub use microcode::{CqCode, cq_codes, cq_rewrite, image_rewrite, rewrite_matches, strip_cq_kind};
pub use tokenizer::{
    has_command_prefix, split_args, take_repeat_marker, tokenize_command,
};
