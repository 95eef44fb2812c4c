//! Authenticated API client.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info, instrument, trace, warn};

use agon_core::error::{Error, HttpError, InvalidInputError};
use agon_core::{
    AccessToken, ApiRequest, ApiResponse, BaseUrl, Credentials, IdentitySource,
    InvalidationReason, LivenessProbe, RefreshToken, Result, SessionEvent, StorageKey, TokenPair,
    TokenStore, User,
};

use crate::config::{ClientConfig, RefreshFailurePolicy};
use crate::endpoints::{LOGIN_PATH, LoginRequest, LoginResponse, PING_PATH, USERS_ME_PATH};
use crate::refresh::Refresher;

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 16;

/// HTTP client for the AGON backend.
///
/// Every call made through [`ApiClient::send`] carries the stored access
/// token. A 401 on anything but the login endpoint triggers one refresh and
/// one replay of the failed request; if the session cannot be recovered the
/// stored tokens are erased and a [`SessionEvent::Invalidated`] is broadcast.
///
/// Clients are cheap to clone (they use internal `Arc`) and are safe to share
/// across tasks.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use agon_client::{ApiClient, ClientConfig};
/// use agon_core::{BaseUrl, Credentials, MemoryTokenStore, User};
///
/// # async fn example() -> Result<(), agon_core::Error> {
/// let config = ClientConfig::new(BaseUrl::new("https://agon.example.edu/api")?);
/// let client = ApiClient::new(config, Arc::new(MemoryTokenStore::new()))?;
///
/// client.login(&Credentials::new("jdoe", "secret")).await?;
/// let me: User = client.get_json("/users/me/").await?;
/// println!("Logged in as {}", me.display_name());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    http: reqwest::Client,
    refresher: Refresher,
    store: Arc<dyn TokenStore>,
    events: broadcast::Sender<SessionEvent>,
    // Held for the whole refresh so concurrent 401s share one refresh call.
    refresh_latch: Mutex<()>,
}

impl ApiClient {
    /// Create a client for the configured backend, reading and writing
    /// tokens through `store`.
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;

        let refresher = Refresher::new(
            &config.base_url,
            config.refresh_timeout,
            &config.user_agent,
        )?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                http,
                refresher,
                store,
                events,
                refresh_latch: Mutex::new(()),
            }),
        })
    }

    /// Returns the backend base URL.
    pub fn base_url(&self) -> &BaseUrl {
        &self.inner.config.base_url
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Subscribe to session lifecycle events.
    ///
    /// The UI layer listens here to navigate to the login screen when the
    /// session is invalidated.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// True when an access token is stored.
    pub fn is_logged_in(&self) -> Result<bool> {
        Ok(self.inner.store.access_token()?.is_some())
    }

    /// The username saved at login, if any.
    pub fn stored_username(&self) -> Result<Option<String>> {
        self.inner.store.get(StorageKey::Username)
    }

    // ========================================================================
    // Request pipeline
    // ========================================================================

    /// Send a request through the authentication pipeline.
    ///
    /// Non-success responses are returned as [`Error::Http`]. Only a 401 on a
    /// non-login request is intercepted; every other failure reaches the
    /// caller untouched.
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        if let Some(token) = self.inner.store.access_token()? {
            request.set_bearer(&token)?;
        }

        let err = match self.dispatch(&request).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        if !err.is_unauthorized() {
            return Err(err);
        }

        if request.is_login() {
            debug!("Login rejected");
            return Err(err);
        }

        self.recover(request, err).await
    }

    /// Handle a 401 on a non-login request.
    ///
    /// Returns the replay's outcome when the session could be refreshed and
    /// `original` otherwise.
    async fn recover(&self, mut request: ApiRequest, original: Error) -> Result<ApiResponse> {
        let stale = request.bearer_token().map(str::to_string);
        let latch = self.inner.refresh_latch.lock().await;

        // Another request may have settled the session while this one waited
        match (stale.as_deref(), self.inner.store.access_token()?) {
            (stale, Some(current)) if stale != Some(current.as_str()) => {
                drop(latch);
                debug!("Access token already rotated, replaying request");
                request.set_bearer(&current)?;
                return self.dispatch(&request).await;
            }
            (Some(_), None) => {
                debug!("Session already ended by a concurrent request");
                return Err(original);
            }
            _ => {}
        }

        let Some(refresh_token) = self.inner.store.refresh_token()? else {
            warn!("Unauthorized with no refresh token stored, ending session");
            self.end_session(&[StorageKey::AccessToken], InvalidationReason::NoRefreshToken);
            return Err(original);
        };

        match self.inner.refresher.refresh(&refresh_token).await {
            Ok(fresh) => {
                let access = AccessToken::new(fresh.access);
                self.inner
                    .store
                    .set(StorageKey::AccessToken, access.as_str())?;
                if let Some(rotated) = fresh.refresh {
                    self.inner.store.set(StorageKey::RefreshToken, &rotated)?;
                }
                drop(latch);

                info!("Access token refreshed, replaying request");
                self.emit(SessionEvent::Refreshed);

                request.set_bearer(&access)?;
                self.dispatch(&request).await
            }
            Err(err) => {
                let reason = if err.is_transient() {
                    InvalidationReason::RefreshUnreachable
                } else {
                    InvalidationReason::RefreshRejected
                };

                if reason == InvalidationReason::RefreshUnreachable
                    && self.inner.config.refresh_failure
                        == RefreshFailurePolicy::KeepSessionOnTransportError
                {
                    warn!(error = %err, "Refresh endpoint unreachable, keeping session");
                    return Err(original);
                }

                warn!(error = %err, %reason, "Refresh failed, ending session");
                self.end_session(&[StorageKey::AccessToken, StorageKey::RefreshToken], reason);
                Err(original)
            }
        }
    }

    /// Erase `keys` and announce the end of the session.
    ///
    /// The event goes out even if the store could not be cleared; the caller
    /// still gets its original 401.
    fn end_session(&self, keys: &[StorageKey], reason: InvalidationReason) {
        if let Err(e) = self.inner.store.remove_all(keys) {
            error!(error = %e, "Failed to erase tokens after session loss");
        }
        self.emit(SessionEvent::Invalidated { reason });
    }

    /// Send a request exactly as given, with no interception.
    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.inner.config.base_url.endpoint(request.path());
        debug!(%url, "Dispatching request");

        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), &url)
            .headers(request.headers().clone());

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.json_body() {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        trace!(status = %status, len = bytes.len(), "Response received");

        if status.is_success() {
            Ok(ApiResponse::new(status, headers, bytes.to_vec()))
        } else {
            Err(Error::Http(HttpError::from_body(status.as_u16(), &bytes)))
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    // ========================================================================
    // JSON helpers
    // ========================================================================

    /// GET a path and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)?).await?.json()
    }

    /// PATCH a JSON body and decode the JSON response.
    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::patch(path).json(body)?).await?.json()
    }

    /// DELETE a path, ignoring any response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(ApiRequest::delete(path)).await.map(|_| ())
    }

    // ========================================================================
    // Session operations
    // ========================================================================

    /// Authenticate and store the new token pair and username.
    ///
    /// A rejected login is returned unchanged (HTTP 400 or 401) and leaves
    /// any stored session as it was.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
        if credentials.is_incomplete() {
            return Err(InvalidInputError::Other {
                message: "username and password are required".to_string(),
            }
            .into());
        }

        info!("Logging in");

        let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest {
            username: credentials.username().trim(),
            password: credentials.password(),
        })?;

        let response: LoginResponse = self.send(request).await?.json()?;

        let store = &self.inner.store;
        store.set(StorageKey::AccessToken, &response.access)?;
        store.set(StorageKey::RefreshToken, &response.refresh)?;
        store.set(StorageKey::Username, credentials.username().trim())?;

        debug!("Login succeeded, tokens stored");
        self.emit(SessionEvent::LoggedIn {
            username: credentials.username().trim().to_string(),
        });

        Ok(TokenPair {
            access: AccessToken::new(response.access),
            refresh: RefreshToken::new(response.refresh),
        })
    }

    /// Erase the stored session.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<()> {
        info!("Logging out");
        self.inner.store.remove_all(&StorageKey::ALL)?;
        self.emit(SessionEvent::LoggedOut);
        Ok(())
    }

    /// Fetch the current user's profile.
    pub async fn current_user(&self) -> Result<User> {
        self.get_json(USERS_ME_PATH).await
    }

    /// Hit the liveness endpoint.
    pub async fn ping(&self) -> Result<()> {
        self.send(ApiRequest::get(PING_PATH)).await.map(|_| ())
    }
}

#[async_trait]
impl IdentitySource for ApiClient {
    async fn fetch_current_user(&self) -> Result<User> {
        self.current_user().await
    }

    fn has_session(&self) -> Result<bool> {
        self.is_logged_in()
    }

    fn erase_tokens(&self) -> Result<()> {
        self.inner
            .store
            .remove_all(&[StorageKey::AccessToken, StorageKey::RefreshToken])
    }
}

#[async_trait]
impl LivenessProbe for ApiClient {
    async fn ping(&self) -> Result<()> {
        ApiClient::ping(self).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url)
            .field("store", &self.inner.store)
            .finish()
    }
}
