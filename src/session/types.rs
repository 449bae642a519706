// Session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account profile as returned by the backend.
/// Treated as an opaque payload; nothing here is validated client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub onboarding_completed: bool,
}

/// Access/refresh token pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// The authenticated state bundle.
///
/// Immutable snapshot: login, refresh and logout replace the whole value
/// in the [`SessionStore`](super::SessionStore), never mutate it in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

impl Session {
    pub fn new(user: UserProfile, tokens: TokenPair) -> Self {
        Self {
            user,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }

    /// The same session with a rotated access token
    pub fn with_access_token(&self, access_token: String) -> Self {
        Self {
            user: self.user.clone(),
            access_token,
            refresh_token: self.refresh_token.clone(),
        }
    }
}
