//! Traits consumed by the identity bootstrap and keep-alive loop.

use async_trait::async_trait;

use crate::types::User;
use crate::Result;

/// Something that can tell us who is logged in.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// Fetch the current user from the backend.
    async fn fetch_current_user(&self) -> Result<User>;

    /// True when an access token is stored.
    fn has_session(&self) -> Result<bool>;

    /// Erase the stored access and refresh tokens.
    fn erase_tokens(&self) -> Result<()>;
}

/// A cheap liveness call that keeps an idle backend from suspending.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn ping(&self) -> Result<()>;
}
