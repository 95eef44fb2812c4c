//! Identity bootstrap.
//!
//! On start-up the front end asks the backend who is logged in. The backend
//! may be waking up from an idle suspension, so transient failures are
//! retried a few times with a fixed pause; a 401 or 403 is final.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use agon_core::{IdentitySource, Result, User};

/// Default number of identity fetch attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1500);

/// Bounded, fixed-delay retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Process-wide view of the current user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserState {
    /// True until the first bootstrap sequence completes.
    pub loading: bool,
    /// The fetched user, if the bootstrap succeeded.
    pub user: Option<User>,
}

impl Default for UserState {
    fn default() -> Self {
        Self {
            loading: true,
            user: None,
        }
    }
}

/// Fetch the current user, retrying transient failures.
///
/// A 401 or 403 ends the sequence at once. When the final failure is a 401
/// the stored tokens are erased; any other final failure leaves them alone,
/// since an unreachable backend says nothing about the session.
#[instrument(skip(source))]
pub async fn fetch_with_retry(source: &dyn IdentitySource, policy: RetryPolicy) -> Result<User> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let err = match source.fetch_current_user().await {
            Ok(user) => {
                debug!(attempt, "Identity fetched");
                return Ok(user);
            }
            Err(err) => err,
        };

        let definitive = err.is_unauthorized() || err.is_forbidden();
        if definitive || attempt >= max_attempts {
            if err.is_unauthorized() {
                warn!("Session rejected by backend, erasing stored tokens");
                if let Err(e) = source.erase_tokens() {
                    warn!(error = %e, "Failed to erase stored tokens");
                }
            }
            warn!(attempt, error = %err, "Identity fetch failed");
            return Err(err);
        }

        debug!(
            attempt,
            error = %err,
            delay_ms = policy.delay.as_millis() as u64,
            "Identity fetch failed, retrying"
        );
        tokio::time::sleep(policy.delay).await;
        attempt += 1;
    }
}

/// Owner of the current-user state.
///
/// The state starts as `loading` with no user. [`IdentityBootstrap::start`]
/// runs once at start-up; [`IdentityBootstrap::refetch`] reruns the fetch
/// (for example right after login).
pub struct IdentityBootstrap {
    source: Arc<dyn IdentitySource>,
    policy: RetryPolicy,
    state: watch::Sender<UserState>,
}

impl IdentityBootstrap {
    pub fn new(source: Arc<dyn IdentitySource>, policy: RetryPolicy) -> Self {
        let (state, _) = watch::channel(UserState::default());
        Self {
            source,
            policy,
            state,
        }
    }

    /// Watch the current-user state.
    pub fn subscribe(&self) -> watch::Receiver<UserState> {
        self.state.subscribe()
    }

    /// A snapshot of the current-user state.
    pub fn state(&self) -> UserState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    /// Resolve the identity at start-up.
    ///
    /// With no stored access token there is nothing to ask the backend; the
    /// state settles immediately with no user. An unreadable token store
    /// settles the same way and returns the storage error.
    pub async fn start(&self) -> Result<Option<User>> {
        match self.source.has_session() {
            Ok(true) => {}
            Ok(false) => {
                debug!("No stored session, skipping identity fetch");
                self.settle(None);
                return Ok(None);
            }
            Err(e) => {
                warn!(error = %e, "Could not read stored session");
                self.settle(None);
                return Err(e);
            }
        }

        self.refetch().await.map(Some)
    }

    /// Fetch the identity again and publish the outcome.
    pub async fn refetch(&self) -> Result<User> {
        let result = fetch_with_retry(self.source.as_ref(), self.policy).await;
        match &result {
            Ok(user) => {
                info!(username = %user.username, role = %user.role, "Identity resolved");
                self.settle(Some(user.clone()));
            }
            Err(_) => self.settle(None),
        }
        result
    }

    /// Replace the cached user.
    pub fn set_user(&self, user: Option<User>) {
        self.state.send_modify(|state| state.user = user);
    }

    /// Merge a partial profile update into the cached user.
    ///
    /// Does nothing when no user is cached.
    pub fn update_user(&self, patch: &Value) -> Result<()> {
        let Some(current) = self.user() else {
            return Ok(());
        };
        let merged = current.merge(patch)?;
        self.set_user(Some(merged));
        Ok(())
    }

    fn settle(&self, user: Option<User>) {
        self.state.send_replace(UserState {
            loading: false,
            user,
        });
    }
}

impl std::fmt::Debug for IdentityBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityBootstrap")
            .field("policy", &self.policy)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::time::Instant;

    use agon_core::error::{Error, HttpError, StorageError, TransportError};

    /// Identity source that plays back scripted outcomes.
    struct Scripted {
        outcomes: Mutex<VecDeque<Result<User>>>,
        calls: AtomicUsize,
        erased: AtomicUsize,
        has_session: bool,
        unreadable: bool,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<User>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
                erased: AtomicUsize::new(0),
                has_session: true,
                unreadable: false,
            })
        }

        fn without_session() -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
                erased: AtomicUsize::new(0),
                has_session: false,
                unreadable: false,
            })
        }

        fn unreadable() -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
                erased: AtomicUsize::new(0),
                has_session: false,
                unreadable: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn erased(&self) -> usize {
            self.erased.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentitySource for Scripted {
        async fn fetch_current_user(&self) -> Result<User> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra fetch")
        }

        fn has_session(&self) -> Result<bool> {
            if self.unreadable {
                return Err(Error::Storage(StorageError::Corrupt {
                    path: "tokens.json".to_string(),
                    message: "expected value at line 1 column 1".to_string(),
                }));
            }
            Ok(self.has_session)
        }

        fn erase_tokens(&self) -> Result<()> {
            self.erased.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn user() -> User {
        serde_json::from_value(json!({
            "id": 3, "username": "jdoe", "first_name": "Juan", "role": "STUDENT"
        }))
        .unwrap()
    }

    fn timeout() -> Result<User> {
        Err(Error::Transport(TransportError::Timeout))
    }

    fn status(code: u16) -> Result<User> {
        Err(Error::Http(HttpError::new(code)))
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt_without_trailing_delay() {
        let source = Scripted::new(vec![timeout(), status(503), Ok(user())]);
        let policy = RetryPolicy::default();

        let started = Instant::now();
        let fetched = fetch_with_retry(source.as_ref(), policy).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(fetched.username, "jdoe");
        assert_eq!(source.calls(), 3);
        assert!(elapsed >= policy.delay * 2, "two pauses expected: {elapsed:?}");
        assert!(elapsed < policy.delay * 3, "no pause after success: {elapsed:?}");
        assert_eq!(source.erased(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_stops_immediately_and_erases_tokens() {
        let source = Scripted::new(vec![status(401)]);

        let started = Instant::now();
        let err = fetch_with_retry(source.as_ref(), RetryPolicy::default())
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(source.calls(), 1);
        assert_eq!(source.erased(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn forbidden_stops_immediately_and_keeps_tokens() {
        let source = Scripted::new(vec![status(403)]);

        let err = fetch_with_retry(source.as_ref(), RetryPolicy::default())
            .await
            .unwrap_err();

        assert!(err.is_forbidden());
        assert_eq!(source.calls(), 1);
        assert_eq!(source.erased(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_network_failures_keep_tokens() {
        let source = Scripted::new(vec![timeout(), timeout(), timeout()]);

        let err = fetch_with_retry(source.as_ref(), RetryPolicy::default())
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(source.calls(), 3);
        assert_eq!(source.erased(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn late_unauthorized_still_erases() {
        let source = Scripted::new(vec![timeout(), status(401)]);

        let err = fetch_with_retry(source.as_ref(), RetryPolicy::default())
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(source.calls(), 2);
        assert_eq!(source.erased(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_tries_once() {
        let source = Scripted::new(vec![timeout()]);

        let result = fetch_with_retry(source.as_ref(), RetryPolicy::new(0, Duration::from_secs(1))).await;

        assert!(result.is_err());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_publishes_state() {
        let source = Scripted::new(vec![timeout(), Ok(user())]);
        let bootstrap = IdentityBootstrap::new(source.clone(), RetryPolicy::default());
        let watcher = bootstrap.subscribe();

        assert!(bootstrap.is_loading());
        assert!(bootstrap.user().is_none());

        let user = bootstrap.start().await.unwrap();

        assert_eq!(user.map(|u| u.id), Some(3));
        let state = watcher.borrow().clone();
        assert!(!state.loading);
        assert_eq!(state.user.unwrap().username, "jdoe");
    }

    #[tokio::test(start_paused = true)]
    async fn bootstrap_failure_clears_loading_without_user() {
        let source = Scripted::new(vec![timeout(), timeout(), timeout()]);
        let bootstrap = IdentityBootstrap::new(source.clone(), RetryPolicy::default());

        assert!(bootstrap.start().await.is_err());

        assert_eq!(
            bootstrap.state(),
            UserState {
                loading: false,
                user: None
            }
        );
    }

    #[tokio::test]
    async fn bootstrap_without_session_skips_fetch() {
        let source = Scripted::without_session();
        let bootstrap = IdentityBootstrap::new(source.clone(), RetryPolicy::default());

        assert!(bootstrap.start().await.unwrap().is_none());
        assert_eq!(source.calls(), 0);
        assert!(!bootstrap.is_loading());
    }

    #[tokio::test]
    async fn unreadable_session_settles_loading() {
        let source = Scripted::unreadable();
        let bootstrap = IdentityBootstrap::new(source.clone(), RetryPolicy::default());

        let err = bootstrap.start().await.unwrap_err();

        assert!(matches!(err, Error::Storage(StorageError::Corrupt { .. })));
        assert_eq!(source.calls(), 0);
        assert!(!bootstrap.is_loading());
        assert!(bootstrap.user().is_none());
    }

    #[tokio::test]
    async fn update_user_merges_into_cached_profile() {
        let source = Scripted::new(vec![Ok(user())]);
        let bootstrap = IdentityBootstrap::new(source, RetryPolicy::default());
        bootstrap.start().await.unwrap();

        bootstrap
            .update_user(&json!({"phone_number": "3001112233"}))
            .unwrap();

        let updated = bootstrap.user().unwrap();
        assert_eq!(updated.phone_number.as_deref(), Some("3001112233"));
        assert_eq!(updated.first_name, "Juan");

        bootstrap.set_user(None);
        bootstrap.update_user(&json!({"phone_number": "1"})).unwrap();
        assert!(bootstrap.user().is_none());
    }
}
