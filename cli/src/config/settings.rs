//! Application configuration settings.

use serde::{Deserialize, Serialize};
use url::Url;

/// Main configuration for staybook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaybookConfig {
    /// Session settings.
    pub auth: AuthConfig,
    /// API client settings.
    pub api: ApiConfig,
}

/// Where the session record is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// OS keyring.
    #[default]
    Keyring,
    /// JSON file in the data directory.
    File,
    /// Process memory only.
    Memory,
}

impl TryFrom<&str> for StorageKind {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "keyring" => Ok(Self::Keyring),
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            _ => Err(format!("Unknown storage: {s}")),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Session storage backend.
    pub storage: StorageKind,
    /// Surface the client navigates to when a session cannot be renewed.
    pub login_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            storage: StorageKind::Keyring,
            login_path: "/login".to_string(),
        }
    }
}

/// API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend API base URL.
    #[serde(with = "url_serde")]
    pub base_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:8000/api/v1").expect("valid default URL"),
            timeout_secs: 15,
        }
    }
}

/// Custom serde module for URL serialization.
mod url_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use url::Url;

    pub fn serialize<S>(url: &Url, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(url.as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Url, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Url::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Environment variables that can override configuration.
pub mod env {
    pub const API_URL: &str = "STAYBOOK_API_URL";
    pub const AUTH_STORAGE: &str = "STAYBOOK_AUTH_STORAGE";
    pub const LOG_LEVEL: &str = "STAYBOOK_LOG";
}

impl StaybookConfig {
    /// Apply environment variable overrides to the configuration.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    #[must_use]
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var(env::API_URL) {
            match Url::parse(&url) {
                Ok(parsed) => self.api.base_url = parsed,
                Err(e) => tracing::warn!("Ignoring {}: {e}", env::API_URL),
            }
        }

        if let Some(storage) = var(env::AUTH_STORAGE) {
            match StorageKind::try_from(storage.as_str()) {
                Ok(kind) => self.auth.storage = kind,
                Err(e) => tracing::warn!("Ignoring {}: {e}", env::AUTH_STORAGE),
            }
        }

        self
    }
}
