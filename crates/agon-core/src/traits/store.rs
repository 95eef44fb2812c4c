//! Token storage trait.

use std::fmt;

use crate::{AccessToken, RefreshToken, Result};

/// Fixed keys of the persisted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AccessToken,
    RefreshToken,
    Username,
}

impl StorageKey {
    /// Every key the client ever writes.
    pub const ALL: [StorageKey; 3] = [
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::Username,
    ];

    /// The on-disk name of this key.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AccessToken => "access_token",
            StorageKey::RefreshToken => "refresh_token",
            StorageKey::Username => "username",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistent key/value storage for session tokens.
///
/// Each call is atomic on its own; the client never needs a transaction
/// spanning several keys.
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// Read a value.
    fn get(&self, key: StorageKey) -> Result<Option<String>>;

    /// Write a value.
    fn set(&self, key: StorageKey, value: &str) -> Result<()>;

    /// Delete a value. Deleting a missing key is not an error.
    fn remove(&self, key: StorageKey) -> Result<()>;

    /// The stored access token, if any.
    fn access_token(&self) -> Result<Option<AccessToken>> {
        Ok(self.get(StorageKey::AccessToken)?.map(AccessToken::new))
    }

    /// The stored refresh token, if any.
    fn refresh_token(&self) -> Result<Option<RefreshToken>> {
        Ok(self.get(StorageKey::RefreshToken)?.map(RefreshToken::new))
    }

    /// Delete several keys.
    fn remove_all(&self, keys: &[StorageKey]) -> Result<()> {
        for key in keys {
            self.remove(*key)?;
        }
        Ok(())
    }
}
