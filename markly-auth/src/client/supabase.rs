use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use oauth2::PkceCodeChallenge;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use url::Url;

use super::config::Settings;
use super::gotrue::{GoTrueClient, GoTrueError};
use super::storage::Storage;
use crate::common::{AuthChangeEvent, OAuthProvider, Session, StoredSession, UserIdentity};
use crate::error::AuthError;
use crate::service::AuthService;

const SESSION_KEY: &str = "session.json";
const CODE_VERIFIER_KEY: &str = "code-verifier";
const EVENT_CAPACITY: usize = 16;

// Refresh tokens a little before they actually expire
const EXPIRY_BUFFER: Duration = Duration::minutes(5);

/// [`AuthService`] backed by a hosted Supabase project.
///
/// Sessions and the pending PKCE verifier live in the injected [`Storage`];
/// every session change is broadcast to subscribers.
pub struct SupabaseAuth {
    client: GoTrueClient,
    storage: Arc<dyn Storage>,
    events: broadcast::Sender<AuthChangeEvent>,
}

impl SupabaseAuth {
    pub fn new(settings: &Settings, storage: Arc<dyn Storage>) -> Result<Self, AuthError> {
        let client = GoTrueClient::new(&settings.supabase_url, &settings.anon_key)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            client,
            storage,
            events,
        })
    }

    fn load_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(json) = self.storage.get_item(SESSION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<StoredSession>(&json) {
            Ok(stored) => Ok(Some(stored.into())),
            Err(e) => {
                tracing::warn!("Discarding unreadable stored session: {}", e);
                self.storage.remove_item(SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    fn save_session(&self, session: &Session) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(&StoredSession::from(session))?;
        self.storage.set_item(SESSION_KEY, &json)
    }

    fn emit(&self, event: AuthChangeEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("No auth state listeners");
        }
    }

    /// Load the stored session, refreshing it when it is about to expire
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.load_session()? else {
            return Ok(None);
        };

        if !session.is_expired(Utc::now() + EXPIRY_BUFFER) {
            return Ok(Some(session));
        }

        tracing::debug!("Stored session expired, refreshing");
        match self
            .client
            .refresh(session.refresh_token.expose_secret())
            .await
        {
            Ok(fresh) => {
                self.save_session(&fresh)?;
                self.emit(AuthChangeEvent::TokenRefreshed(fresh.clone()));
                Ok(Some(fresh))
            }
            Err(e @ GoTrueError::Api { .. }) => {
                // The refresh token was rejected, so the session is gone for good
                tracing::warn!("Session refresh rejected: {}", e);
                self.storage.remove_item(SESSION_KEY)?;
                self.emit(AuthChangeEvent::SignedOut);
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl AuthService for SupabaseAuth {
    async fn get_user(&self) -> Result<Option<UserIdentity>, AuthError> {
        let Some(session) = self.current_session().await? else {
            return Ok(None);
        };

        let user = self
            .client
            .get_user(session.access_token.expose_secret())
            .await?;
        Ok(Some(user))
    }

    async fn session(&self) -> Result<Option<Session>, AuthError> {
        self.current_session().await
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError> {
        let verifier = self
            .storage
            .get_item(CODE_VERIFIER_KEY)?
            .ok_or(AuthError::MissingCodeVerifier)?;

        let result = self.client.exchange_pkce(code, verifier.trim()).await;
        // A verifier is good for one exchange attempt only
        self.storage.remove_item(CODE_VERIFIER_KEY)?;
        let session = result?;

        self.save_session(&session)?;
        tracing::info!(user_id = %session.user.id, "Exchanged authorization code for session");
        self.emit(AuthChangeEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, AuthError> {
        if access_token.is_empty() {
            return Err(AuthError::MissingAccessToken);
        }

        let expires_at = jwt_expiry(access_token).ok_or(AuthError::InvalidAccessToken)?;

        let session = if expires_at <= Utc::now() {
            if refresh_token.is_empty() {
                return Err(AuthError::MissingRefreshToken);
            }
            tracing::debug!("Redirect access token already expired, refreshing");
            self.client.refresh(refresh_token).await?
        } else {
            let user = self.client.get_user(access_token).await?;
            Session {
                access_token: SecretString::from(access_token.to_string()),
                refresh_token: SecretString::from(refresh_token.to_string()),
                expires_at,
                user,
            }
        };

        self.save_session(&session)?;
        tracing::info!(user_id = %session.user.id, "Established session from redirect tokens");
        self.emit(AuthChangeEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(session) = self.load_session()? {
            self.client
                .logout(session.access_token.expose_secret())
                .await?;
        }

        self.storage.remove_item(SESSION_KEY)?;
        self.storage.remove_item(CODE_VERIFIER_KEY)?;
        tracing::info!("Signed out");
        self.emit(AuthChangeEvent::SignedOut);
        Ok(())
    }

    async fn sign_in_with_redirect(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<Url, AuthError> {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        self.storage
            .set_item(CODE_VERIFIER_KEY, verifier.secret())?;

        let url = self
            .client
            .authorize_url(provider, redirect_to, challenge.as_str())?;
        tracing::info!(provider = %provider, "Prepared provider sign-in");
        Ok(url)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChangeEvent> {
        self.events.subscribe()
    }
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// Read the `exp` claim of a JWT without verifying its signature
fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::prelude::BASE64_URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes).ok()?;
    DateTime::<Utc>::from_timestamp(claim.exp, 0)
}
