//! Session lifecycle events broadcast by the client.

use std::fmt;

/// Why a session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    /// The backend rejected the refresh token.
    RefreshRejected,
    /// The refresh call never got an answer.
    RefreshUnreachable,
    /// A 401 arrived and no refresh token was stored.
    NoRefreshToken,
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvalidationReason::RefreshRejected => "refresh token rejected",
            InvalidationReason::RefreshUnreachable => "refresh endpoint unreachable",
            InvalidationReason::NoRefreshToken => "no refresh token stored",
        };
        f.write_str(s)
    }
}

/// Something that happened to the stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Login succeeded and tokens were stored.
    LoggedIn { username: String },
    /// The access token was replaced after a refresh.
    Refreshed,
    /// The user logged out.
    LoggedOut,
    /// Tokens were erased after an unrecoverable auth failure.
    Invalidated { reason: InvalidationReason },
}

impl SessionEvent {
    /// True for events after which the user must log in again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            SessionEvent::LoggedOut | SessionEvent::Invalidated { .. }
        )
    }
}
