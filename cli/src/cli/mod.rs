//! CLI module for staybook.

pub mod args;
pub mod commands;
pub mod context;

pub use args::{AuthCommands, Cli, Commands, SearchCommands};
pub use context::AppContext;
