//! Command implementations.

pub mod auth;
pub mod completions;
pub mod search;

pub use auth::{handle_login, handle_logout, handle_register, handle_status};
pub use completions::handle_completions;
pub use search::handle_search;
