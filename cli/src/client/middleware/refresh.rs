//! Token refresh middleware: recovers from an expired access token.

use std::sync::Arc;

use async_trait::async_trait;
use http::{Extensions, HeaderValue};
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{Error, Middleware, Next, Result};

use crate::client::session::SessionManager;
use crate::error::StaybookError;

/// Extension marking a request that has already been through a refresh cycle.
#[derive(Debug, Clone, Copy)]
pub struct RefreshAttempted;

/// Extension opting a request out of refresh handling (login, register, logout).
#[derive(Debug, Clone, Copy)]
pub struct SkipRefresh;

/// Middleware that renews the session on 401 and replays the request once.
pub struct TokenRefreshMiddleware {
    session: Arc<SessionManager>,
}

impl TokenRefreshMiddleware {
    /// Create a new token refresh middleware.
    #[must_use]
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(String::from)
}

#[async_trait]
impl Middleware for TokenRefreshMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let eligible = extensions.get::<SkipRefresh>().is_none()
            && extensions.get::<RefreshAttempted>().is_none();

        // Bodies are consumed by sending, so keep a copy for the replay.
        let replay = if eligible { req.try_clone() } else { None };
        let sent_token = bearer_token(&req);

        let response = next.clone().run(req, extensions).await?;

        match response.status() {
            StatusCode::UNAUTHORIZED if eligible => {}
            StatusCode::FORBIDDEN => {
                tracing::warn!(url = %response.url(), "Permission denied");
                return Ok(response);
            }
            _ => return Ok(response),
        }

        let Some(mut replay) = replay else {
            tracing::debug!(
                url = %response.url(),
                "Request body cannot be replayed; not refreshing"
            );
            return Ok(response);
        };

        extensions.insert(RefreshAttempted);
        tracing::debug!(url = %response.url(), "Received 401; renewing session");
        drop(response);

        let token = self
            .session
            .renewed_token(sent_token.as_deref())
            .await
            .map_err(Error::middleware)?;

        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::middleware(StaybookError::InvalidCredentials))?;
        value.set_sensitive(true);
        replay
            .headers_mut()
            .insert(http::header::AUTHORIZATION, value);

        next.run(replay, extensions).await
    }
}
