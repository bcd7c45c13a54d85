//! HTTP client for the booking API.
//!
//! - [`StaybookApiClient`] - endpoints and status mapping
//! - [`middleware`] - bearer injection and 401 recovery
//! - [`SessionManager`] - single-flight session refresh
//! - [`Navigator`] - where the user is sent when a session ends

pub mod api;
pub mod middleware;
pub mod navigator;
pub mod session;

pub use api::StaybookApiClient;
pub use navigator::{Navigator, TerminalNavigator};
pub use session::SessionManager;
