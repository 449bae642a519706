// Auth wire types

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ApiError;
use crate::session::{Session, TokenPair, UserProfile};

/// Envelope the backend wraps every payload in
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
}

/// Deserialize an enveloped response and unwrap `.data`
pub async fn unwrap_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let envelope: ApiEnvelope<T> = response.json().await?;
    Ok(envelope.data)
}

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Registration request body
#[derive(Debug, Clone, Serialize)]
pub struct RegisterData {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Refresh request body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh response payload
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedToken {
    pub access_token: String,
}

/// Login/register response payload.
///
/// The backend returns either a single `token` field or a `tokens` pair;
/// both shapes normalize into a [`Session`].
#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    pub user: UserProfile,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub tokens: Option<TokenPair>,
}

impl AuthPayload {
    /// Normalize into the internal session shape. When only a single token
    /// is supplied it serves as both access and refresh token.
    pub fn into_session(self) -> Result<Session, ApiError> {
        let tokens = match (self.tokens, self.token) {
            (Some(pair), _) => pair,
            (None, Some(token)) => TokenPair {
                access_token: token.clone(),
                refresh_token: token,
            },
            (None, None) => {
                return Err(ApiError::Internal(anyhow::anyhow!(
                    "auth response carries no token"
                )))
            }
        };

        Ok(Session::new(self.user, tokens))
    }
}

/// Body shape of rejected requests; tolerant of anything else
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<HashMap<String, String>>,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_json(tokens: &str) -> String {
        format!(
            r#"{{
                "user": {{
                    "id": "usr-7",
                    "name": "Rui",
                    "email": "rui@example.com",
                    "createdAt": "2025-02-10T08:00:00Z",
                    "onboardingCompleted": false
                }},
                {tokens}
            }}"#
        )
    }

    #[test]
    fn test_single_token_normalizes_to_both_slots() {
        let payload: AuthPayload =
            serde_json::from_str(&payload_json(r#""token": "abc""#)).unwrap();

        let session = payload.into_session().unwrap();
        assert_eq!(session.access_token, "abc");
        assert_eq!(session.refresh_token, "abc");
        assert_eq!(session.user.id, "usr-7");
    }

    #[test]
    fn test_token_pair_is_taken_verbatim() {
        let payload: AuthPayload = serde_json::from_str(&payload_json(
            r#""tokens": {"accessToken": "a", "refreshToken": "b"}"#,
        ))
        .unwrap();

        let session = payload.into_session().unwrap();
        assert_eq!(session.access_token, "a");
        assert_eq!(session.refresh_token, "b");
    }

    #[test]
    fn test_pair_wins_over_single_token() {
        let payload: AuthPayload = serde_json::from_str(&payload_json(
            r#""token": "legacy", "tokens": {"accessToken": "a", "refreshToken": "b"}"#,
        ))
        .unwrap();

        let session = payload.into_session().unwrap();
        assert_eq!(session.access_token, "a");
        assert_eq!(session.refresh_token, "b");
    }

    #[test]
    fn test_missing_tokens_is_an_error() {
        let payload: AuthPayload =
            serde_json::from_str(&payload_json(r#""token": null"#)).unwrap();
        assert!(payload.into_session().is_err());
    }

    #[test]
    fn test_envelope_deserialization() {
        let json = r#"{"success": true, "data": {"accessToken": "fresh"}, "message": null}"#;
        let envelope: ApiEnvelope<RefreshedToken> = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.access_token, "fresh");
        assert!(envelope.message.is_none());
    }

    #[test]
    fn test_error_body_with_field_map() {
        let body = ErrorBody::parse(
            r#"{"success": false, "message": "invalid input", "errors": {"email": "already in use"}}"#,
        );
        assert_eq!(body.message.as_deref(), Some("invalid input"));
        assert_eq!(
            body.errors.unwrap().get("email").map(String::as_str),
            Some("already in use")
        );
    }

    #[test]
    fn test_error_body_tolerates_garbage() {
        let body = ErrorBody::parse("<html>502 Bad Gateway</html>");
        assert!(body.message.is_none());
        assert!(body.errors.is_none());
    }
}
