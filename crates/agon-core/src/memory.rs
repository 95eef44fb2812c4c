//! In-memory token store.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::traits::{StorageKey, TokenStore};
use crate::Result;

/// A [`TokenStore`] that lives only as long as the process.
///
/// Useful for tests and for front ends that do not persist sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    values: RwLock<HashMap<StorageKey, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with an access and an optional refresh token.
    pub fn with_tokens(access: &str, refresh: Option<&str>) -> Self {
        let mut values = HashMap::new();
        values.insert(StorageKey::AccessToken, access.to_string());
        if let Some(refresh) = refresh {
            values.insert(StorageKey::RefreshToken, refresh.to_string());
        }
        Self {
            values: RwLock::new(values),
        }
    }
}

// Values are tokens; only the keys are shown.
impl fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        let keys: Vec<&str> = values.keys().map(StorageKey::as_str).collect();
        f.debug_struct("MemoryTokenStore").field("keys", &keys).finish()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(&key).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(StorageKey::AccessToken).unwrap(), None);

        store.set(StorageKey::AccessToken, "a1").unwrap();
        assert_eq!(store.access_token().unwrap().unwrap().as_str(), "a1");

        store.remove(StorageKey::AccessToken).unwrap();
        store.remove(StorageKey::AccessToken).unwrap();
        assert!(store.access_token().unwrap().is_none());
    }

    #[test]
    fn remove_all_leaves_other_keys() {
        let store = MemoryTokenStore::with_tokens("a", Some("r"));
        store.set(StorageKey::Username, "jdoe").unwrap();

        store
            .remove_all(&[StorageKey::AccessToken, StorageKey::RefreshToken])
            .unwrap();

        assert!(store.access_token().unwrap().is_none());
        assert!(store.refresh_token().unwrap().is_none());
        assert_eq!(
            store.get(StorageKey::Username).unwrap().as_deref(),
            Some("jdoe")
        );
    }
}
