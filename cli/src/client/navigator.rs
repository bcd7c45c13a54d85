//! The surface the user is currently on, and how to move them off it.

use std::sync::{Mutex, PoisonError};

/// Navigation hook used when a session ends.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Path of the surface currently shown.
    fn current_path(&self) -> String;

    /// Moves the user to `path`.
    fn navigate(&self, path: &str);
}

/// Navigator for the terminal: the surface is the command being run.
///
/// Arriving on the login surface prints a sign-in notice to stderr.
pub struct TerminalNavigator {
    location: Mutex<String>,
    login_path: String,
}

impl TerminalNavigator {
    /// Starts on `surface` (for example `/hotels` for `staybook search hotels`).
    #[must_use]
    pub fn new(surface: impl Into<String>) -> Self {
        Self {
            location: Mutex::new(surface.into()),
            login_path: "/login".to_string(),
        }
    }

    /// Sets the path treated as the login surface.
    #[must_use]
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    fn arrival_notice(&self, path: &str) -> Option<&'static str> {
        (path == self.login_path)
            .then_some("Session ended. Run 'staybook auth login' to sign in again.")
    }
}

impl Navigator for TerminalNavigator {
    fn current_path(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn navigate(&self, path: &str) {
        let mut location = self.location.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::info!(from = %location, to = %path, "Navigating");
        *location = path.to_string();
        drop(location);

        if let Some(notice) = self.arrival_notice(path) {
            eprintln!("{notice}");
        }
    }
}
