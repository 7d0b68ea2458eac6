use chrono::{serde::ts_seconds, DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the signed-in user as issued by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Access and refresh token pair representing an authenticated user.
///
/// Token material is kept in [`SecretString`] so it never shows up in `Debug`
/// output or logs.
#[derive(Debug)]
pub struct Session {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: DateTime<Utc>,
    pub user: UserIdentity,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            access_token: SecretString::from(self.access_token.expose_secret().to_owned()),
            refresh_token: SecretString::from(self.refresh_token.expose_secret().to_owned()),
            expires_at: self.expires_at,
            user: self.user.clone(),
        }
    }
}

/// On-disk form of a [`Session`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "ts_seconds")]
    pub expires_at: DateTime<Utc>,
    pub user: UserIdentity,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token.expose_secret().to_owned(),
            refresh_token: session.refresh_token.expose_secret().to_owned(),
            expires_at: session.expires_at,
            user: session.user.clone(),
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self {
            access_token: SecretString::from(stored.access_token),
            refresh_token: SecretString::from(stored.refresh_token),
            expires_at: stored.expires_at,
            user: stored.user,
        }
    }
}

/// Notification emitted whenever the service establishes or clears a session
#[derive(Debug, Clone)]
pub enum AuthChangeEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

impl AuthChangeEvent {
    /// The session this event leaves behind, if any
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => Some(session),
            Self::SignedOut => None,
        }
    }
}

/// External identity providers the service can redirect to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }
}

impl std::fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
