//! Per-invocation wiring of store, navigator and API client.

use std::sync::Arc;

use crate::auth::{open_backend, AuthStore};
use crate::client::{StaybookApiClient, TerminalNavigator};
use crate::config::StaybookConfig;
use crate::error::Result;

/// Everything a command needs to talk to the booking API.
pub struct AppContext {
    pub config: StaybookConfig,
    pub client: StaybookApiClient,
}

impl AppContext {
    /// Rehydrates the session and builds the client for a command running on `surface`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be opened or the
    /// HTTP client cannot be built.
    pub fn open(config: StaybookConfig, surface: &str) -> Result<Self> {
        let store = Arc::new(AuthStore::open(open_backend(config.auth.storage)?));
        let navigator =
            Arc::new(TerminalNavigator::new(surface).with_login_path(&config.auth.login_path));
        let client = StaybookApiClient::new(&config, store, navigator)?;

        Ok(Self { config, client })
    }
}
