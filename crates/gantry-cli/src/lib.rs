//! CLI interface for gantry.
//!
//! The binary entry point lives in `main.rs`; this library exposes the
//! parser, bootstrap, and handlers for testing and integration.

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use parser::Cli;
