// Session controller
// Orchestrates login, registration, logout and hydration against the
// backend, keeping the token store and persisted credentials consistent

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::models::{
    unwrap_envelope, AuthPayload, ErrorBody, LoginCredentials, RegisterData,
};
use crate::error::ApiError;
use crate::http_client::ApiClient;
use crate::runtime::RuntimeContext;
use crate::session::{Session, SessionStore, UserProfile};
use crate::storage::SecureStorage;

pub struct SessionController {
    api: Arc<ApiClient>,
    store: Arc<SessionStore>,
    storage: SecureStorage,
    runtime: Arc<dyn RuntimeContext>,

    /// Set once the first hydration attempt starts; later calls are served
    /// from the store
    hydration_started: AtomicBool,
}

impl SessionController {
    pub fn new(
        api: Arc<ApiClient>,
        store: Arc<SessionStore>,
        storage: SecureStorage,
        runtime: Arc<dyn RuntimeContext>,
    ) -> Self {
        Self {
            api,
            store,
            storage,
            runtime,
            hydration_started: AtomicBool::new(false),
        }
    }

    /// Authenticate with email and password.
    /// Persists the credentials and installs the session on success.
    pub async fn login(&self, credentials: LoginCredentials) -> Result<Session, ApiError> {
        tracing::debug!(email = %credentials.email, "Logging in");

        let response = self
            .api
            .post_json("/auth/login", &credentials)
            .await
            .map_err(classify_login_error)?;

        let payload: AuthPayload = unwrap_envelope(response).await?;
        let session = payload.into_session()?;
        self.install(&session);

        tracing::info!(user = %session.user.email, "Login successful");
        Ok(session)
    }

    /// Create an account. Same persistence behavior as login.
    pub async fn register(&self, data: RegisterData) -> Result<Session, ApiError> {
        tracing::debug!(email = %data.email, "Registering account");

        let response = self
            .api
            .post_json("/auth/register", &data)
            .await
            .map_err(classify_register_error)?;

        let payload: AuthPayload = unwrap_envelope(response).await?;
        let session = payload.into_session()?;
        self.install(&session);

        tracing::info!(user = %session.user.email, "Registration successful");
        Ok(session)
    }

    /// End the session. Backend invalidation is best effort; the local
    /// teardown is unconditional and this never fails.
    pub async fn logout(&self) {
        if let Err(e) = self.api.post_empty("/auth/logout").await {
            tracing::warn!("Backend logout failed, clearing local session anyway: {}", e);
        }

        self.storage.clear_tokens();
        self.store.write(None);
        tracing::info!("Logged out");
    }

    /// Rebuild the session from persisted credentials.
    ///
    /// The profile fetch runs at most once per controller; any later call
    /// answers from the store. Skipped entirely when the runtime has no
    /// persistent storage. On any failure the persisted credentials are
    /// cleared and the session stays absent.
    pub async fn hydrate(&self) -> Option<Session> {
        if !self.runtime.has_persistent_storage() {
            return None;
        }
        if self.hydration_started.swap(true, Ordering::SeqCst) {
            return self.store.read();
        }
        if let Some(session) = self.store.read() {
            return Some(session);
        }
        if self.storage.access_token().is_none() {
            return None;
        }

        tracing::debug!("Hydrating session from persisted credentials");
        match self.fetch_profile().await {
            Ok(user) => {
                let tokens = (self.storage.access_token(), self.storage.refresh_token());
                match tokens {
                    (Some(access_token), Some(refresh_token)) => {
                        let session = Session {
                            user,
                            access_token,
                            refresh_token,
                        };
                        self.store.write(Some(session.clone()));
                        tracing::info!(user = %session.user.email, "Session hydrated");
                        Some(session)
                    }
                    _ => {
                        // Tokens vanished between the fetch and the install
                        self.storage.clear_tokens();
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Session hydration failed: {}", e);
                self.storage.clear_tokens();
                None
            }
        }
    }

    /// Fetch the authenticated user's profile
    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        let response = self.api.get("/auth/profile").await?;
        unwrap_envelope(response).await
    }

    /// Persist the credentials, then replace the store snapshot
    fn install(&self, session: &Session) {
        self.storage
            .store_tokens(&session.access_token, &session.refresh_token);
        self.store.write(Some(session.clone()));
    }
}

/// 400/401 on login means the backend rejected the credentials
fn classify_login_error(e: ApiError) -> ApiError {
    match e.status() {
        Some(400) | Some(401) => ApiError::InvalidCredentials,
        _ => e,
    }
}

/// 409 on register is a taken email; 400 carries field-level messages
fn classify_register_error(e: ApiError) -> ApiError {
    match e {
        ApiError::Backend { status: 409, .. } => ApiError::EmailAlreadyExists,
        ApiError::Backend { status: 400, body } => {
            let parsed = ErrorBody::parse(&body);
            ApiError::Validation {
                message: parsed
                    .message
                    .unwrap_or_else(|| "invalid registration data".to_string()),
                fields: parsed.errors.unwrap_or_default(),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_classification() {
        let err = classify_login_error(ApiError::Backend {
            status: 401,
            body: "{}".to_string(),
        });
        assert!(matches!(err, ApiError::InvalidCredentials));

        let err = classify_login_error(ApiError::Backend {
            status: 400,
            body: "{}".to_string(),
        });
        assert!(matches!(err, ApiError::InvalidCredentials));

        // Anything else passes through untouched
        let err = classify_login_error(ApiError::Backend {
            status: 500,
            body: "oops".to_string(),
        });
        assert!(matches!(err, ApiError::Backend { status: 500, .. }));
    }

    #[test]
    fn test_register_conflict_classification() {
        let err = classify_register_error(ApiError::Backend {
            status: 409,
            body: "{}".to_string(),
        });
        assert!(matches!(err, ApiError::EmailAlreadyExists));
    }

    #[test]
    fn test_register_validation_classification() {
        let err = classify_register_error(ApiError::Backend {
            status: 400,
            body: r#"{"success":false,"message":"invalid input","errors":{"password":"too short"}}"#
                .to_string(),
        });

        match err {
            ApiError::Validation { message, fields } => {
                assert_eq!(message, "invalid input");
                assert_eq!(fields.get("password").map(String::as_str), Some("too short"));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_register_validation_with_unparseable_body() {
        let err = classify_register_error(ApiError::Backend {
            status: 400,
            body: "not json".to_string(),
        });

        match err {
            ApiError::Validation { message, fields } => {
                assert_eq!(message, "invalid registration data");
                assert!(fields.is_empty());
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }
}
