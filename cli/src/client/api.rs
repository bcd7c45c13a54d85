//! Staybook API client implementation.

use std::sync::Arc;
use std::time::Duration;

use http::{header, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::{AuthStore, LoginForm, RegisterForm, TokenPair};
use crate::client::middleware::{AuthMiddleware, SkipRefresh, TokenRefreshMiddleware};
use crate::client::{Navigator, SessionManager};
use crate::config::StaybookConfig;
use crate::error::{Result, StaybookError};

const LOGIN_PATH: &str = "auth/login/";
const REGISTER_PATH: &str = "auth/register/";
const REFRESH_PATH: &str = "auth/refresh/";
const LOGOUT_PATH: &str = "auth/logout/";

/// Main API client for communicating with the booking backend.
///
/// Every request carries the current access token. A 401 triggers one
/// shared session refresh and a single replay of the request.
pub struct StaybookApiClient {
    client: ClientWithMiddleware,
    base_url: Url,
    session: Arc<SessionManager>,
}

impl StaybookApiClient {
    /// Create a new API client around `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the base URL
    /// cannot hold endpoint paths.
    pub fn new(
        config: &StaybookConfig,
        store: Arc<AuthStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let inner_client = Client::builder()
            .user_agent(format!("staybook/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        let base_url = with_trailing_slash(config.api.base_url.clone());
        let session = Arc::new(SessionManager::new(
            Arc::clone(&store),
            navigator,
            inner_client.clone(),
            base_url.join(REFRESH_PATH)?,
            config.auth.login_path.clone(),
        ));

        // Build middleware stack
        let client = ClientBuilder::new(inner_client)
            .with(AuthMiddleware::new(store))
            .with(TokenRefreshMiddleware::new(Arc::clone(&session)))
            .build();

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    /// The session manager behind this client.
    #[cfg(test)]
    #[must_use]
    pub const fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// The credential store behind this client.
    #[must_use]
    pub fn store(&self) -> &Arc<AuthStore> {
        self.session.store()
    }

    /// Resolves an endpoint path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`StaybookError::InvalidUrl`] if the path cannot be joined.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Signs in and stores the issued token pair.
    ///
    /// # Errors
    ///
    /// Returns [`StaybookError::Validation`] for malformed input,
    /// [`StaybookError::InvalidLogin`] if the server rejects the credentials,
    /// or a transport/API error.
    pub async fn login(&self, form: &LoginForm) -> Result<()> {
        form.validate()?;

        let response = self
            .client
            .post(self.endpoint(LOGIN_PATH)?)
            .with_extension(SkipRefresh)
            .body(serde_json::to_string(form)?)
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED
        ) {
            return Err(StaybookError::InvalidLogin);
        }

        let tokens: TokenPair = parse_json(check_status(response).await?).await?;
        self.establish(tokens)?;
        tracing::info!("Signed in");
        Ok(())
    }

    /// Creates an account and stores the issued token pair.
    ///
    /// # Errors
    ///
    /// Returns [`StaybookError::Validation`] for malformed input, or the
    /// API error describing why the server refused the account.
    pub async fn register(&self, form: &RegisterForm) -> Result<()> {
        form.validate()?;

        let response = self
            .client
            .post(self.endpoint(REGISTER_PATH)?)
            .with_extension(SkipRefresh)
            .body(serde_json::to_string(form)?)
            .send()
            .await?;

        let tokens: TokenPair = parse_json(check_status(response).await?).await?;
        self.establish(tokens)?;
        tracing::info!("Account created");
        Ok(())
    }

    /// Ends the session.
    ///
    /// The server is asked to invalidate the refresh token when one is
    /// stored; a failure there is logged and does not stop the local logout.
    pub async fn logout(&self) {
        if let Some(refresh) = self.store().state().refresh_token {
            if let Err(e) = self.revoke(&refresh).await {
                tracing::warn!("Server-side logout failed: {e}");
            }
        }

        self.session.end_session();
        tracing::info!("Signed out");
    }

    /// Issues an authenticated GET and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`StaybookError::Unauthorized`] if the request is still
    /// rejected after a session refresh, [`StaybookError::TokenRefreshFailed`]
    /// if the refresh itself failed, [`StaybookError::Forbidden`] on 403, or
    /// a transport/API error.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.endpoint(path)?)
            .query(query)
            .send()
            .await?;

        parse_json(check_status(response).await?).await
    }

    async fn revoke(&self, refresh: &str) -> Result<()> {
        let body = serde_json::json!({ "refresh": refresh });
        let response = self
            .client
            .post(self.endpoint(LOGOUT_PATH)?)
            .with_extension(SkipRefresh)
            .body(serde_json::to_string(&body)?)
            .send()
            .await?;

        check_status(response).await.map(drop)
    }

    fn establish(&self, tokens: TokenPair) -> Result<()> {
        let refresh = tokens.refresh.ok_or_else(|| {
            StaybookError::Serialization("response is missing the refresh token".to_string())
        })?;
        self.store().set_auth(tokens.access, refresh);
        Ok(())
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Maps non-success statuses to errors.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(StaybookError::Unauthorized),
        StatusCode::SERVICE_UNAVAILABLE => Err(StaybookError::ApiUnavailable),
        _ => {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if status == StatusCode::FORBIDDEN {
                Err(StaybookError::Forbidden(message))
            } else {
                Err(StaybookError::ApiError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| StaybookError::Serialization(e.to_string()))
}
