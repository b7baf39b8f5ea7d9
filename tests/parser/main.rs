//! Integration tests for Layer 1: Parser
//!
//! Tests for mentions, micro-codes, and the command tokenizer.

mod mention;
mod microcode;
mod tokenizer;
