//! Login redirect on session loss.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use agon_core::{Navigator, SessionEvent};

/// Default route of the login screen.
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Sends the user to the login screen when the session ends.
///
/// Navigation is skipped when the login screen is already showing, so a
/// failing request made from the login screen cannot loop.
#[derive(Clone)]
pub struct LoginRedirector {
    navigator: Arc<dyn Navigator>,
    login_route: String,
}

impl LoginRedirector {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self::with_route(navigator, DEFAULT_LOGIN_ROUTE)
    }

    pub fn with_route(navigator: Arc<dyn Navigator>, login_route: impl Into<String>) -> Self {
        Self {
            navigator,
            login_route: login_route.into(),
        }
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// React to one event. Returns true if navigation happened.
    pub fn handle(&self, event: &SessionEvent) -> bool {
        if !event.requires_login() {
            return false;
        }

        if self.navigator.current_route() == self.login_route {
            debug!(?event, "Already on login route");
            return false;
        }

        info!(?event, route = %self.login_route, "Redirecting to login");
        self.navigator.navigate(&self.login_route);
        true
    }

    /// Handle every event from `events` on a background task.
    pub fn spawn(self, mut events: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        self.handle(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed session events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

impl std::fmt::Debug for LoginRedirector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRedirector")
            .field("login_route", &self.login_route)
            .finish()
    }
}
