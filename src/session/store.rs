// Token store
// Holds at most one Session and broadcasts replacements to subscribers

use tokio::sync::watch;

use super::Session;

/// Process-wide holder of the current [`Session`].
///
/// Pure value store: `write` replaces the snapshot wholesale, there is no
/// merging. Consumers that need to react to login/logout subscribe to the
/// underlying watch channel.
pub struct SessionStore {
    tx: watch::Sender<Option<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Current session snapshot, if any
    pub fn read(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Replace the session wholesale; `None` clears it
    pub fn write(&self, session: Option<Session>) {
        self.tx.send_replace(session);
    }

    /// Reactive view of the session; resolves whenever it is replaced
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{TokenPair, UserProfile};

    fn test_session() -> Session {
        Session::new(
            UserProfile {
                id: "usr-1".to_string(),
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                created_at: "2025-03-01T12:00:00Z".parse().unwrap(),
                onboarding_completed: false,
            },
            TokenPair {
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
            },
        )
    }

    #[test]
    fn test_store_starts_empty() {
        let store = SessionStore::new();
        assert!(store.read().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_write_replaces_wholesale() {
        let store = SessionStore::new();

        store.write(Some(test_session()));
        assert!(store.is_authenticated());
        assert_eq!(store.read().unwrap().access_token, "access");

        let rotated = test_session().with_access_token("rotated".to_string());
        store.write(Some(rotated));
        assert_eq!(store.read().unwrap().access_token, "rotated");

        store.write(None);
        assert!(store.read().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_replacements() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();

        store.write(Some(test_session()));
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());

        store.write(None);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
