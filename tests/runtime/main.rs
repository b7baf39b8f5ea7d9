//! Integration tests for Layer 2: Runtime
//!
//! Tests for variable tiers and message handling.

mod scope;
mod session;
