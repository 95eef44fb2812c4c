//! Client configuration.

use std::time::Duration;

use agon_core::BaseUrl;

/// Main request timeout. A suspended backend can take most of a minute to
/// come back, so this is deliberately long.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// Timeout of the token refresh call.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// What to do when the refresh call itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshFailurePolicy {
    /// Any refresh failure ends the session.
    #[default]
    Terminal,
    /// A refresh call that gets no answer (timeout, connection error, 5xx)
    /// leaves the stored tokens alone; only an explicit rejection ends the
    /// session.
    KeepSessionOnTransportError,
}

/// Configuration for [`crate::ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: BaseUrl,
    pub timeout: Duration,
    pub refresh_timeout: Duration,
    pub refresh_failure: RefreshFailurePolicy,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            refresh_failure: RefreshFailurePolicy::default(),
            user_agent: concat!("agon-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_refresh_failure(mut self, policy: RefreshFailurePolicy) -> Self {
        self.refresh_failure = policy;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
