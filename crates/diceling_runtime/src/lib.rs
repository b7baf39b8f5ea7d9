//! Variable scopes, sessions, and the interactive console for Diceling.
//!
//! This crate provides:
//! - [`ScopedVariables`] - Four-tier variable resolution with aliases
//! - [`TextTemplates`] - Weighted-random reply templates
//! - [`Session`] - Message in, reply out, for the built-in commands
//! - [`Repl`] - Interactive console over a session
//! - [`init_logging`] - `RUST_LOG`-driven tracing subscriber for binaries

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod editor;
pub mod repl;
pub mod scope;
pub mod session;
pub mod store;
pub mod templates;

pub use config::BotConfig;
pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use repl::{CONSOLE_USER_ID, Repl};
pub use scope::{AliasTable, ScopeTier, ScopedVariables, VarMap};
pub use session::{BUILTIN_COMMANDS, BuiltinCommand, Message, Session};
pub use store::{Seat, VariableStore};
pub use templates::{TemplateItem, TextTemplates, builtin_templates};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs a formatting subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset, or when a subscriber is already
/// installed. Returns true if this call installed one.
pub fn init_logging() -> bool {
    if std::env::var_os("RUST_LOG").is_none() {
        return false;
    }
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok()
}
