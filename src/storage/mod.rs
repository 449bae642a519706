// Secure storage adapter
// Persists the two credential strings; degrades to a no-op when the
// medium is unavailable or failing

mod backend;

pub use backend::{MemoryBackend, SqliteBackend, StorageBackend, StorageError};

use std::sync::Arc;

/// Storage key for the persisted access token
pub const ACCESS_TOKEN_KEY: &str = "partilio_token";

/// Storage key for the persisted refresh token
pub const REFRESH_TOKEN_KEY: &str = "partilio_refresh_token";

/// Safe get/set/remove over an optional [`StorageBackend`].
///
/// Callers never see a storage failure: when the backend is absent (no
/// persistent storage in this runtime) or errors, reads return `None` and
/// writes are dropped with a warning. Access/refresh tokens are the only
/// values the pipeline keeps here.
#[derive(Clone)]
pub struct SecureStorage {
    backend: Option<Arc<dyn StorageBackend>>,
}

impl SecureStorage {
    /// Storage over a live backend
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Storage for runtimes without a persistence medium; all operations
    /// are no-ops
    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let backend = self.backend.as_ref()?;
        match backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read \"{}\" from credential storage: {}", key, e);
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(e) = backend.set(key, value) {
            tracing::warn!("Failed to write \"{}\" to credential storage: {}", key, e);
        }
    }

    pub fn remove(&self, key: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(e) = backend.remove(key) {
            tracing::warn!(
                "Failed to remove \"{}\" from credential storage: {}",
                key,
                e
            );
        }
    }

    /// Persist both credential strings
    pub fn store_tokens(&self, access_token: &str, refresh_token: &str) {
        self.set(ACCESS_TOKEN_KEY, access_token);
        self.set(REFRESH_TOKEN_KEY, refresh_token);
    }

    /// Remove both credential strings
    pub fn clear_tokens(&self) {
        self.remove(ACCESS_TOKEN_KEY);
        self.remove(REFRESH_TOKEN_KEY);
    }

    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend where every operation fails
    struct BrokenBackend;

    impl StorageBackend for BrokenBackend {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("medium offline".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("medium offline".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("medium offline".to_string()))
        }
    }

    #[test]
    fn test_roundtrip_over_memory_backend() {
        let storage = SecureStorage::new(Arc::new(MemoryBackend::new()));

        storage.store_tokens("access-1", "refresh-1");
        assert_eq!(storage.access_token(), Some("access-1".to_string()));
        assert_eq!(storage.refresh_token(), Some("refresh-1".to_string()));

        storage.clear_tokens();
        assert_eq!(storage.access_token(), None);
        assert_eq!(storage.refresh_token(), None);
    }

    #[test]
    fn test_failing_backend_never_raises() {
        let storage = SecureStorage::new(Arc::new(BrokenBackend));

        // Every operation degrades silently
        storage.set(ACCESS_TOKEN_KEY, "value");
        assert_eq!(storage.get(ACCESS_TOKEN_KEY), None);
        storage.remove(ACCESS_TOKEN_KEY);
        storage.store_tokens("a", "b");
        storage.clear_tokens();
    }

    #[test]
    fn test_unavailable_storage_is_noop() {
        let storage = SecureStorage::unavailable();

        storage.set(ACCESS_TOKEN_KEY, "value");
        assert_eq!(storage.get(ACCESS_TOKEN_KEY), None);
        storage.remove(ACCESS_TOKEN_KEY);
    }
}
