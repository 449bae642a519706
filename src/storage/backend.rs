// Storage backends
// Durable and in-memory key/value stores for the persisted credentials

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Failure of the underlying persistence medium.
///
/// These never escape the [`SecureStorage`](super::SecureStorage) adapter;
/// it logs them and degrades to a no-op.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage operation failed: {0}")]
    Backend(#[from] rusqlite::Error),
}

/// A named-string persistence medium
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Durable backend: a single `auth_kv` table in a SQLite file
pub struct SqliteBackend {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteBackend {
    /// Open (or create) the credential store at `path`
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        }

        let conn = rusqlite::Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS auth_kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open the store at the configured location
    pub fn open_default(path: &PathBuf) -> Result<Self, StorageError> {
        tracing::debug!("Opening credential store: {}", path.display());
        Self::open(path)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("credential store lock poisoned".to_string()))
    }
}

impl StorageBackend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM auth_kv WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO auth_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            [key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM auth_kv WHERE key = ?", [key])?;
        Ok(())
    }
}

/// In-memory backend for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryBackend {
    values: DashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new();

        assert_eq!(backend.get("token").unwrap(), None);

        backend.set("token", "abc").unwrap();
        assert_eq!(backend.get("token").unwrap(), Some("abc".to_string()));

        backend.set("token", "def").unwrap();
        assert_eq!(backend.get("token").unwrap(), Some("def".to_string()));

        backend.remove("token").unwrap();
        assert_eq!(backend.get("token").unwrap(), None);
    }

    #[test]
    fn test_memory_backend_remove_missing_key() {
        let backend = MemoryBackend::new();
        backend.remove("never-set").unwrap();
    }

    #[test]
    fn test_sqlite_backend_roundtrip() {
        let dir = std::env::temp_dir().join(format!("partilio-test-{}", std::process::id()));
        let path = dir.join("credentials.sqlite3");
        let backend = SqliteBackend::open(&path).unwrap();

        assert_eq!(backend.get("partilio_token").unwrap(), None);

        backend.set("partilio_token", "tok-1").unwrap();
        assert_eq!(
            backend.get("partilio_token").unwrap(),
            Some("tok-1".to_string())
        );

        // Upsert replaces
        backend.set("partilio_token", "tok-2").unwrap();
        assert_eq!(
            backend.get("partilio_token").unwrap(),
            Some("tok-2".to_string())
        );

        backend.remove("partilio_token").unwrap();
        assert_eq!(backend.get("partilio_token").unwrap(), None);

        std::fs::remove_dir_all(&dir).ok();
    }
}
