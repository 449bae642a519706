// Session context
// Explicit composition root for the session pipeline; the application
// builds exactly one of these at startup

use anyhow::{Context as _, Result};
use std::sync::Arc;

use crate::auth::SessionController;
use crate::config::Config;
use crate::dashboard::DashboardService;
use crate::http_client::ApiClient;
use crate::runtime::RuntimeContext;
use crate::session::SessionStore;
use crate::storage::{SecureStorage, SqliteBackend, StorageBackend};

/// The one-session-for-the-app object: storage, store, client, controller
/// and services wired together. Shared by handing out clones of the inner
/// `Arc`s; there is no global state behind it.
pub struct SessionContext {
    pub store: Arc<SessionStore>,
    pub storage: SecureStorage,
    pub api: Arc<ApiClient>,
    pub auth: Arc<SessionController>,
    pub dashboard: DashboardService,
}

impl SessionContext {
    /// Build the context with the default credential store.
    ///
    /// A credential store that cannot be opened degrades to no persistence
    /// rather than failing startup.
    pub fn new(config: &Config, runtime: Arc<dyn RuntimeContext>) -> Result<Self> {
        let storage = if runtime.has_persistent_storage() {
            match SqliteBackend::open_default(&config.credentials_file) {
                Ok(backend) => SecureStorage::new(Arc::new(backend)),
                Err(e) => {
                    tracing::warn!(
                        "Credential store unavailable, continuing without persistence: {}",
                        e
                    );
                    SecureStorage::unavailable()
                }
            }
        } else {
            SecureStorage::unavailable()
        };

        Self::assemble(config, runtime, storage)
    }

    /// Build the context over a caller-supplied storage backend
    pub fn with_backend(
        config: &Config,
        runtime: Arc<dyn RuntimeContext>,
        backend: Arc<dyn StorageBackend>,
    ) -> Result<Self> {
        Self::assemble(config, runtime, SecureStorage::new(backend))
    }

    fn assemble(
        config: &Config,
        runtime: Arc<dyn RuntimeContext>,
        storage: SecureStorage,
    ) -> Result<Self> {
        let store = Arc::new(SessionStore::new());

        let api = Arc::new(
            ApiClient::new(config, store.clone(), storage.clone(), runtime.clone())
                .context("Failed to assemble API client")?,
        );

        let auth = Arc::new(SessionController::new(
            api.clone(),
            store.clone(),
            storage.clone(),
            runtime,
        ));

        let dashboard = DashboardService::new(api.clone());

        Ok(Self {
            store,
            storage,
            api,
            auth,
            dashboard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{NativeRuntime, ServerRuntime};
    use crate::storage::MemoryBackend;

    #[test]
    fn test_context_assembles_over_memory_backend() {
        let ctx = SessionContext::with_backend(
            &Config::default(),
            Arc::new(NativeRuntime),
            Arc::new(MemoryBackend::new()),
        )
        .unwrap();

        assert!(ctx.store.read().is_none());
        assert_eq!(ctx.storage.access_token(), None);
    }

    #[test]
    fn test_server_runtime_gets_no_storage() {
        let ctx = SessionContext::new(&Config::default(), Arc::new(ServerRuntime)).unwrap();

        ctx.storage.set("partilio_token", "value");
        assert_eq!(ctx.storage.get("partilio_token"), None);
    }
}
