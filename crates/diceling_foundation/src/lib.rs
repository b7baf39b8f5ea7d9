//! Core value types and errors for Diceling.
//!
//! This crate provides:
//! - [`Value`] - The tagged value produced and consumed by the dice VM
//! - [`Type`] - Type tags used in diagnostics
//! - [`Error`] - Error types shared by every layer

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod types;
pub mod value;

pub use error::{Error, ErrorContext, ErrorKind, EvalLimit, Result};
pub use types::Type;
pub use value::{ComputedValue, Value};
