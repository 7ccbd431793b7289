//! CLI Adapter
//!
//! Command-line interface for the holdsync binary. Uses clap derive macros
//! for argument parsing; command handlers live in the binary crate.

mod commands;

pub use commands::{AddCmd, ClearCmd, CliApp, Command, ImportCmd, StatusCmd, SyncCmd};
