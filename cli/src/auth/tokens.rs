//! Token types for authentication.

use serde::{Deserialize, Serialize};

/// Session state held by the credential store.
///
/// This is also the persisted record, serialized as
/// `{"accessToken", "refreshToken", "isAuthenticated"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    /// Short-lived bearer credential.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Longer-lived credential presented to the refresh endpoint.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// True once a login, registration or refresh has set both tokens.
    #[serde(default)]
    pub is_authenticated: bool,
}

impl AuthState {
    /// A fully established session.
    #[must_use]
    pub fn authenticated(access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token,
            is_authenticated: true,
        }
    }

    /// Drops the authenticated flag from a record that has no access token.
    ///
    /// Persisted records may have been edited or written by older versions.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.access_token.is_none() {
            self.is_authenticated = false;
        }
        self
    }

    /// Value for the `Authorization` header, if a token is present.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.access_token.as_ref().map(|t| format!("Bearer {t}"))
    }
}

/// Tokens returned by the login, register and refresh endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    /// New access token.
    #[serde(alias = "accessToken", alias = "access_token")]
    pub access: String,
    /// Refresh token, present on login and when the server rotates it.
    #[serde(default, alias = "refreshToken", alias = "refresh_token")]
    pub refresh: Option<String>,
}
