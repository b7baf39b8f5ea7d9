//! Integration tests for Layer 1: Language
//!
//! Tests for the expression compiler and the stack VM.

mod compiler;
mod vm;
