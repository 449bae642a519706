// HTTP client and auth interceptor
// Attaches bearer credentials to outgoing requests and transparently
// refreshes the access token once when a request comes back 401

use anyhow::{anyhow, Context};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::auth::{unwrap_envelope, RefreshRequest, RefreshedToken};
use crate::config::Config;
use crate::error::ApiError;
use crate::runtime::RuntimeContext;
use crate::session::SessionStore;
use crate::storage::{SecureStorage, ACCESS_TOKEN_KEY};

/// One original request plus its single-retry marker.
/// A request is retried at most once, however many 401s come back.
struct Attempt {
    request: Request,
    retried: bool,
}

impl Attempt {
    fn set_bearer(&mut self, token: &str) -> Result<(), ApiError> {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ApiError::Internal(anyhow!("invalid bearer token: {}", e)))?;
        self.request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// HTTP client for the Partilio backend.
///
/// Every request issued through [`get`](ApiClient::get) /
/// [`post_json`](ApiClient::post_json) and friends passes through the auth
/// pipeline: bearer attachment on the way out, refresh-and-retry on a 401
/// on the way back. In runtimes without persistent storage the pipeline is
/// a pass-through.
pub struct ApiClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Backend base address; request paths are appended to it
    base_url: String,

    store: Arc<SessionStore>,
    storage: SecureStorage,
    runtime: Arc<dyn RuntimeContext>,

    /// Serializes refresh attempts so concurrent 401s cause one refresh call
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    pub fn new(
        config: &Config,
        store: Arc<SessionStore>,
        storage: SecureStorage,
        runtime: Arc<dyn RuntimeContext>,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_request_timeout))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            store,
            storage,
            runtime,
            refresh_lock: Mutex::new(()),
        })
    }

    pub async fn get(&self, path: &str) -> Result<Response, ApiError> {
        let request = self.client.get(self.url(path)).build()?;
        self.execute(request).await
    }

    pub async fn get_with_query<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<Response, ApiError> {
        let request = self.client.get(self.url(path)).query(query).build()?;
        self.execute(request).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        let request = self.client.post(self.url(path)).json(body).build()?;
        self.execute(request).await
    }

    pub async fn post_empty(&self, path: &str) -> Result<Response, ApiError> {
        let request = self.client.post(self.url(path)).build()?;
        self.execute(request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Token attached to outgoing requests. Persisted storage is the source
    /// of truth (it survives process restarts and exists before the Session
    /// does during hydration); the in-memory Session covers degraded storage.
    fn current_access_token(&self) -> Option<String> {
        self.storage
            .access_token()
            .or_else(|| self.store.read().map(|s| s.access_token))
    }

    /// Run a request through the auth pipeline
    async fn execute(&self, request: Request) -> Result<Response, ApiError> {
        let client_side = self.runtime.has_persistent_storage();
        let mut attempt = Attempt {
            request,
            retried: false,
        };
        let mut bearer: Option<String> = None;

        if client_side {
            bearer = self.current_access_token();
            if let Some(ref token) = bearer {
                attempt.set_bearer(token)?;
            }
        }

        loop {
            let req = attempt
                .request
                .try_clone()
                .ok_or_else(|| ApiError::Internal(anyhow!("request body is not cloneable")))?;

            tracing::debug!(
                method = %req.method(),
                url = %req.url(),
                retried = attempt.retried,
                "Sending request"
            );

            let response = self.client.execute(req).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !attempt.retried && client_side {
                attempt.retried = true;

                match self.try_refresh(bearer.as_deref()).await? {
                    Some(token) => {
                        attempt.set_bearer(&token)?;
                        bearer = Some(token);
                        tracing::debug!("Retrying request with refreshed token");
                        continue;
                    }
                    // No refresh token persisted: surface the original response
                    None => return into_result(response).await,
                }
            }

            return into_result(response).await;
        }
    }

    /// Exchange the persisted refresh token for a new access token.
    ///
    /// Returns `Ok(None)` when no refresh token is persisted (the caller
    /// propagates the original error). A failed exchange tears the whole
    /// session down before surfacing [`ApiError::SessionExpired`].
    async fn try_refresh(&self, stale: Option<&str>) -> Result<Option<String>, ApiError> {
        let _guard = self.refresh_lock.lock().await;

        // A concurrent 401 may have finished the refresh while this request
        // waited for the lock; reuse the rotated token instead of spending
        // the refresh token again.
        if let Some(current) = self.current_access_token() {
            if stale != Some(current.as_str()) {
                tracing::debug!("Access token already rotated by a concurrent refresh");
                return Ok(Some(current));
            }
        }

        let Some(refresh_token) = self.storage.refresh_token() else {
            return Ok(None);
        };

        match self.request_refreshed_token(&refresh_token).await {
            Ok(access_token) => {
                self.storage.set(ACCESS_TOKEN_KEY, &access_token);
                if let Some(session) = self.store.read() {
                    self.store
                        .write(Some(session.with_access_token(access_token.clone())));
                }
                tracing::debug!("Access token refreshed");
                Ok(Some(access_token))
            }
            Err(e) => {
                tracing::warn!("Token refresh failed, tearing down session: {}", e);
                self.storage.clear_tokens();
                self.store.write(None);
                if self.runtime.has_navigation() {
                    self.runtime.redirect_to_login();
                }
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Call the refresh endpoint directly, outside the pipeline
    async fn request_refreshed_token(&self, refresh_token: &str) -> Result<String, ApiError> {
        let url = self.url("/auth/refresh-token");
        let fingerprint = machine_fingerprint();

        let response = self
            .client
            .post(&url)
            .header(
                "User-Agent",
                format!(
                    "partilio-client/{}-{}",
                    env!("CARGO_PKG_VERSION"),
                    fingerprint
                ),
            )
            .json(&RefreshRequest {
                refresh_token: refresh_token.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let refreshed: RefreshedToken = unwrap_envelope(response).await?;
        if refreshed.access_token.is_empty() {
            return Err(ApiError::Internal(anyhow!(
                "refresh response does not contain accessToken"
            )));
        }

        Ok(refreshed.access_token)
    }
}

/// Convert a response into the pipeline result, mapping non-success
/// statuses to [`ApiError::Backend`]
async fn into_result(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(
        status = status.as_u16(),
        body = %body,
        "Backend returned an error response"
    );
    Err(ApiError::Backend {
        status: status.as_u16(),
        body,
    })
}

/// Stable per-machine fingerprint for the refresh User-Agent
fn machine_fingerprint() -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    let mut hasher = DefaultHasher::new();
    host.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}
