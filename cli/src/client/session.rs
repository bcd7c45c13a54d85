//! Single-flight session refresh.
//!
//! When a request is rejected with 401, the refresh middleware asks the
//! [`SessionManager`] for a renewed access token. The first caller performs
//! the refresh call; callers arriving while it is in flight are queued and
//! settled with the same outcome once it completes. The in-progress flag and
//! the queue are owned by the manager instance, so separate clients never
//! share refresh state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::Client;
use tokio::sync::oneshot;
use url::Url;

use crate::auth::{AuthStore, TokenPair};
use crate::client::navigator::Navigator;
use crate::error::{Result, StaybookError};

type Waiter = oneshot::Sender<Result<String>>;

#[derive(Default)]
struct RefreshGate {
    in_progress: bool,
    waiters: Vec<Waiter>,
}

impl RefreshGate {
    fn settle(&mut self) -> Vec<Waiter> {
        self.in_progress = false;
        std::mem::take(&mut self.waiters)
    }
}

/// Clears the in-progress flag if the refreshing future is dropped before
/// it settles. Queued callers then observe a closed channel.
struct SettleGuard<'a> {
    gate: &'a Mutex<RefreshGate>,
    settled: bool,
}

impl SettleGuard<'_> {
    fn settle(mut self) -> Vec<Waiter> {
        self.settled = true;
        lock(self.gate).settle()
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let abandoned = lock(self.gate).settle();
            tracing::warn!(queued = abandoned.len(), "Session refresh abandoned");
        }
    }
}

fn lock(gate: &Mutex<RefreshGate>) -> MutexGuard<'_, RefreshGate> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the refresh protocol for one API client.
pub struct SessionManager {
    store: Arc<AuthStore>,
    navigator: Arc<dyn Navigator>,
    http: Client,
    refresh_url: Url,
    login_path: String,
    gate: Mutex<RefreshGate>,
}

impl SessionManager {
    /// Creates a session manager.
    ///
    /// `http` must be a client without the refresh middleware, so that the
    /// refresh call can never trigger another refresh.
    #[must_use]
    pub fn new(
        store: Arc<AuthStore>,
        navigator: Arc<dyn Navigator>,
        http: Client,
        refresh_url: Url,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            store,
            navigator,
            http,
            refresh_url,
            login_path: login_path.into(),
            gate: Mutex::new(RefreshGate::default()),
        }
    }

    /// The credential store this manager keeps current.
    #[must_use]
    pub const fn store(&self) -> &Arc<AuthStore> {
        &self.store
    }

    /// Whether a refresh call is outstanding.
    #[cfg(test)]
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        lock(&self.gate).in_progress
    }

    /// Number of callers waiting on the outstanding refresh.
    #[cfg(test)]
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.gate).waiters.len()
    }

    /// Returns an access token fresher than `stale`, the one a rejected
    /// request carried.
    ///
    /// # Errors
    ///
    /// Returns [`StaybookError::TokenRefreshFailed`] if the refresh call
    /// fails. In that case the store has been cleared and the navigator
    /// moved to the login surface, and every queued caller receives the
    /// same error.
    pub async fn renewed_token(&self, stale: Option<&str>) -> Result<String> {
        let queued = {
            let mut gate = lock(&self.gate);

            // A refresh that settled after this request was sent already
            // produced a newer token.
            if !gate.in_progress {
                if let Some(current) = self.store.access_token() {
                    if stale != Some(current.as_str()) {
                        tracing::debug!("Session already renewed; reusing current token");
                        return Ok(current);
                    }
                }
            }

            if gate.in_progress {
                let (tx, rx) = oneshot::channel();
                gate.waiters.push(tx);
                tracing::debug!(
                    queued = gate.waiters.len(),
                    "Refresh in progress; queuing request"
                );
                Some(rx)
            } else {
                gate.in_progress = true;
                None
            }
        };

        if let Some(rx) = queued {
            return rx.await.unwrap_or_else(|_| {
                Err(StaybookError::TokenRefreshFailed(
                    "session refresh was abandoned".to_string(),
                ))
            });
        }

        let guard = SettleGuard {
            gate: &self.gate,
            settled: false,
        };

        match self.request_refresh().await {
            Ok(tokens) => {
                self.store
                    .update_access(tokens.access.clone(), tokens.refresh);
                let waiters = guard.settle();
                tracing::info!(queued = waiters.len(), "Session refreshed");
                for waiter in waiters {
                    let _ = waiter.send(Ok(tokens.access.clone()));
                }
                Ok(tokens.access)
            }
            Err(reason) => {
                self.store.clear();
                let waiters = guard.settle();
                tracing::warn!(queued = waiters.len(), "Session refresh failed: {reason}");
                for waiter in waiters {
                    let _ = waiter.send(Err(StaybookError::TokenRefreshFailed(reason.clone())));
                }
                self.redirect_to_login();
                Err(StaybookError::TokenRefreshFailed(reason))
            }
        }
    }

    /// Clears the session and leaves the current surface (logout).
    pub fn end_session(&self) {
        self.store.clear();
        self.redirect_to_login();
    }

    fn redirect_to_login(&self) {
        let current = self.navigator.current_path();
        if current.contains(&self.login_path) {
            tracing::debug!(path = %current, "Already on the login surface");
            return;
        }
        self.navigator.navigate(&self.login_path);
    }

    /// Calls the refresh endpoint once. Errors are reported as a reason string
    /// shared by every caller of the failed refresh.
    async fn request_refresh(&self) -> std::result::Result<TokenPair, String> {
        // Without a stored refresh token the server falls back to its
        // session cookie.
        let body = match self.store.state().refresh_token {
            Some(token) => serde_json::json!({ "refresh": token }),
            None => serde_json::json!({}),
        };

        tracing::debug!(url = %self.refresh_url, "Requesting session refresh");
        let response = self
            .http
            .post(self.refresh_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| StaybookError::from(e).to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("refresh rejected ({status})"));
        }

        response
            .json::<TokenPair>()
            .await
            .map_err(|e| format!("malformed refresh response: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::navigator::{MockNavigator, TerminalNavigator};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manager(
        server: &MockServer,
        store: Arc<AuthStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Arc<SessionManager> {
        let refresh_url = Url::parse(&format!("{}/auth/refresh/", server.uri())).unwrap();
        Arc::new(SessionManager::new(
            store,
            navigator,
            Client::new(),
            refresh_url,
            "/login",
        ))
    }

    fn on(surface: &str) -> Arc<TerminalNavigator> {
        Arc::new(TerminalNavigator::new(surface))
    }

    fn logged_in_store() -> Arc<AuthStore> {
        let store = Arc::new(AuthStore::in_memory());
        store.set_auth("old", "r1");
        store
    }

    async fn mount_refresh(server: &MockServer, response: ResponseTemplate, calls: u64) {
        Mock::given(method("POST"))
            .and(path("/auth/refresh/"))
            .respond_with(response)
            .expect(calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn refresh_presents_stored_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/"))
            .and(body_json(serde_json::json!({ "refresh": "r1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access": "new",
                "refresh": "r2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = logged_in_store();
        let session = manager(&server, Arc::clone(&store), on("/hotels"));

        let token = session.renewed_token(Some("old")).await.unwrap();

        assert_eq!(token, "new");
        let state = store.state();
        assert_eq!(state.access_token.as_deref(), Some("new"));
        assert_eq!(state.refresh_token.as_deref(), Some("r2"));
        assert!(!session.is_refreshing());
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_sends_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/"))
            .and(body_json(serde_json::json!({})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "accessToken": "new" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(AuthStore::in_memory());
        let session = manager(&server, Arc::clone(&store), on("/hotels"));

        assert_eq!(session.renewed_token(None).await.unwrap(), "new");
        assert!(store.is_authenticated());
        assert_eq!(store.state().refresh_token, None);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let server = MockServer::start().await;
        mount_refresh(
            &server,
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "access": "new" }))
                .set_delay(Duration::from_millis(300)),
            1,
        )
        .await;

        let session = manager(&server, logged_in_store(), on("/hotels"));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.renewed_token(Some("old")).await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(session.is_refreshing());
        assert_eq!(session.pending(), 4);

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "new");
        }
        assert_eq!(session.pending(), 0);
        assert!(!session.is_refreshing());
    }

    #[tokio::test]
    async fn failed_refresh_rejects_everyone_and_logs_out() {
        let server = MockServer::start().await;
        mount_refresh(
            &server,
            ResponseTemplate::new(401).set_delay(Duration::from_millis(200)),
            1,
        )
        .await;

        let mut navigator = MockNavigator::new();
        navigator
            .expect_current_path()
            .return_const("/restaurants".to_string());
        navigator
            .expect_navigate()
            .withf(|path| path == "/login")
            .times(1)
            .return_const(());

        let store = logged_in_store();
        let session = manager(&server, Arc::clone(&store), Arc::new(navigator));

        let leader = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.renewed_token(Some("old")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let follower = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.renewed_token(Some("old")).await })
        };

        let leader = leader.await.unwrap();
        let follower = follower.await.unwrap();

        for result in [leader, follower] {
            assert!(
                matches!(
                    result,
                    Err(StaybookError::TokenRefreshFailed(ref m)) if m.contains("401")
                ),
                "unexpected {result:?}"
            );
        }
        assert!(!store.is_authenticated());
        assert_eq!(store.state().refresh_token, None);
        assert_eq!(session.pending(), 0);
        assert!(!session.is_refreshing());
    }

    #[tokio::test]
    async fn failed_refresh_on_login_surface_does_not_navigate() {
        let server = MockServer::start().await;
        mount_refresh(&server, ResponseTemplate::new(500), 1).await;

        let mut navigator = MockNavigator::new();
        navigator
            .expect_current_path()
            .return_const("/en/login".to_string());
        navigator.expect_navigate().times(0);

        let session = manager(&server, logged_in_store(), Arc::new(navigator));

        assert!(session.renewed_token(Some("old")).await.is_err());
    }

    #[tokio::test]
    async fn malformed_refresh_body_is_a_failure() {
        let server = MockServer::start().await;
        mount_refresh(
            &server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "x" })),
            1,
        )
        .await;

        let store = logged_in_store();
        let session = manager(&server, Arc::clone(&store), on("/hotels"));

        let result = session.renewed_token(Some("old")).await;
        assert!(matches!(
            result,
            Err(StaybookError::TokenRefreshFailed(ref m)) if m.starts_with("malformed")
        ));
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn newer_stored_token_skips_refresh() {
        let server = MockServer::start().await;
        mount_refresh(&server, ResponseTemplate::new(200), 0).await;

        let store = Arc::new(AuthStore::in_memory());
        store.set_auth("newer", "r1");
        let session = manager(&server, store, on("/hotels"));

        assert_eq!(session.renewed_token(Some("old")).await.unwrap(), "newer");
    }

    #[tokio::test]
    async fn abandoned_refresh_releases_waiters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access": "new" }))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let session = manager(&server, logged_in_store(), on("/hotels"));

        let leader = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.renewed_token(Some("old")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let follower = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.renewed_token(Some("old")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(session.pending(), 1);

        leader.abort();
        let result = follower.await.unwrap();

        assert!(matches!(result, Err(StaybookError::TokenRefreshFailed(_))));
        assert!(!session.is_refreshing());
    }

    #[tokio::test]
    async fn end_session_clears_store_and_navigates() {
        let server = MockServer::start().await;
        let store = logged_in_store();
        let navigator = on("/account");
        let session = manager(&server, Arc::clone(&store), navigator.clone());

        session.end_session();

        assert!(!store.is_authenticated());
        assert_eq!(navigator.current_path(), "/login");
    }
}
