//! agon-client - Authenticated REST client for the AGON portal backend.
//!
//! [`ApiClient`] attaches the stored bearer token to every call and recovers
//! from an expired access token by refreshing it and replaying the request.
//! [`IdentityBootstrap`] resolves the current user at start-up, riding out a
//! cold-starting backend. [`KeepAlive`] and [`LoginRedirector`] are the small
//! pieces a front end wires around them.

mod bootstrap;
mod client;
mod config;
mod endpoints;
mod keepalive;
mod redirect;
mod refresh;

pub use bootstrap::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, IdentityBootstrap, RetryPolicy, UserState,
    fetch_with_retry,
};
pub use client::ApiClient;
pub use config::{ClientConfig, DEFAULT_REFRESH_TIMEOUT, DEFAULT_TIMEOUT, RefreshFailurePolicy};
pub use endpoints::{LOGIN_PATH, PING_PATH, REFRESH_PATH, USERS_ME_PATH};
pub use keepalive::{DEFAULT_PING_INTERVAL, KeepAlive, MIN_PING_INTERVAL};
pub use redirect::{DEFAULT_LOGIN_ROUTE, LoginRedirector};
