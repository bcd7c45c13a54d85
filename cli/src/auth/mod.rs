//! Authentication module for staybook.
//!
//! This module provides the session credential store, its durable storage
//! backends, and the login/registration forms.

pub mod credentials;
pub mod forms;
pub mod store;
pub mod tokens;

pub use credentials::open_backend;
pub use forms::{LoginForm, RegisterForm};
pub use store::AuthStore;
pub use tokens::TokenPair;
