//! Backend endpoint paths and their request/response bodies.

use serde::{Deserialize, Serialize};

pub use agon_core::{LOGIN_PATH, REFRESH_PATH};

/// Current user profile.
pub const USERS_ME_PATH: &str = "/users/me/";

/// Lightweight liveness endpoint.
pub const PING_PATH: &str = "/ping/";

/// Request body for `/token/`.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response from `/token/`.
#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub access: String,
    pub refresh: String,
}

/// Request body for `/token/refresh/`.
#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response from `/token/refresh/`.
///
/// A `refresh` value is only present when the backend rotates refresh tokens.
#[derive(Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}
