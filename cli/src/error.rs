//! Error types and result aliases for staybook.
//!
//! This module provides a single error enum for the whole client:
//! - Specific error variants for each failure mode of the booking API
//! - User-friendly error messages with recovery suggestions
//! - Helper methods for error classification
//! - Conversion from the HTTP stack, including errors raised inside middleware

use thiserror::Error;

/// Main error type for staybook operations.
///
/// Each variant includes a user-friendly message with actionable recovery steps.
/// Use [`requires_reauth`](Self::requires_reauth) and [`is_retriable`](Self::is_retriable)
/// to determine appropriate error handling strategies.
#[derive(Error, Debug)]
pub enum StaybookError {
    /// API returned 401 even after the session was refreshed.
    #[error("API server returned unauthorized (401). Run 'staybook auth login' to sign in again.")]
    Unauthorized,

    /// API returned 403. The session is valid but lacks permission.
    #[error("Permission denied (403): {0}")]
    Forbidden(String),

    /// Login was rejected by the server.
    #[error("Invalid email or password.")]
    InvalidLogin,

    /// The refresh call failed. The session has been cleared.
    #[error("Your session has expired and could not be renewed. Run 'staybook auth login' to sign in again. Details: {0}")]
    TokenRefreshFailed(String),

    /// API returned a non-success status code.
    #[error("API request failed ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// API server is unreachable (503 or connection failed).
    #[error("API server is unavailable. Check your network connection or try again later.")]
    ApiUnavailable,

    /// Request timed out.
    #[error("Request timed out. The server may be slow or unreachable. Try again later.")]
    Timeout,

    /// Network error during HTTP request.
    #[error("Network error: {0}. Check your internet connection.")]
    Network(String),

    /// Failed to access the credential slot.
    #[error("Failed to access credential storage: {0}. Ensure your system keyring is unlocked or use 'storage = \"file\"'.")]
    CredentialStorage(String),

    /// Stored credentials are malformed or corrupted.
    #[error("Invalid credentials. Your stored session may be corrupted. Try 'staybook auth logout' then 'staybook auth login'.")]
    InvalidCredentials,

    /// User input was rejected before reaching the server.
    #[error("{0}")]
    Validation(String),

    /// General configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}. Check file permissions and format.")]
    ConfigRead(String),

    /// Failed to write configuration file.
    #[error("Failed to write configuration file: {0}. Check directory permissions.")]
    ConfigWrite(String),

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON or TOML serialization/deserialization failed.
    #[error("Data serialization error: {0}. This may indicate corrupted data.")]
    Serialization(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl StaybookError {
    /// Checks if this error can be resolved by signing in again.
    #[must_use]
    pub const fn requires_reauth(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized
                | Self::TokenRefreshFailed(_)
                | Self::InvalidCredentials
        )
    }

    /// Checks if this error is transient and the operation might succeed on retry.
    ///
    /// The client itself never retries these; callers decide.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout | Self::ApiUnavailable)
    }
}

/// Result type alias using [`StaybookError`].
pub type Result<T> = std::result::Result<T, StaybookError>;

impl From<serde_json::Error> for StaybookError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON error: {err}"))
    }
}

impl From<toml::de::Error> for StaybookError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigRead(format!("TOML parse error: {err}"))
    }
}

impl From<toml::ser::Error> for StaybookError {
    fn from(err: toml::ser::Error) -> Self {
        Self::ConfigWrite(format!("TOML serialize error: {err}"))
    }
}

impl From<keyring::Error> for StaybookError {
    fn from(err: keyring::Error) -> Self {
        Self::CredentialStorage(err.to_string())
    }
}

impl From<reqwest::Error> for StaybookError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::ApiUnavailable
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for StaybookError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            // Middleware errors are our own errors boxed into anyhow.
            reqwest_middleware::Error::Middleware(e) => match e.downcast::<Self>() {
                Ok(inner) => inner,
                Err(other) => Self::Network(other.to_string()),
            },
        }
    }
}
