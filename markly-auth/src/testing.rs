//! Scripted in-memory [`AuthService`] for tests of code built on the auth layer.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::SecretString;
use std::sync::Mutex;
use tokio::sync::broadcast;
use url::Url;
use uuid::Uuid;

use crate::client::GoTrueError;
use crate::common::{AuthChangeEvent, OAuthProvider, Session, UserIdentity};
use crate::error::AuthError;
use crate::service::AuthService;

/// One recorded call into [`MockAuthService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCall {
    GetUser,
    Session,
    ExchangeCode(String),
    SetSession {
        access_token: String,
        refresh_token: String,
    },
    SignOut,
    SignInWithRedirect {
        provider: OAuthProvider,
        redirect_to: String,
    },
}

/// Identity every successful sign-in resolves to
pub fn test_user() -> UserIdentity {
    UserIdentity {
        id: Uuid::from_u128(0x5c1b_2c56_4a0e_4f8c_9b1a_2f4e_8d7c_6b5a),
        email: Some("ada@example.com".to_string()),
        display_name: Some("Ada Lovelace".to_string()),
    }
}

pub fn test_session(user: UserIdentity) -> Session {
    Session {
        access_token: SecretString::from("test-access-token".to_string()),
        refresh_token: SecretString::from("test-refresh-token".to_string()),
        expires_at: Utc::now() + Duration::hours(1),
        user,
    }
}

fn rejection(message: &str) -> AuthError {
    AuthError::Service(GoTrueError::Api {
        status: 400,
        message: message.to_string(),
    })
}

pub struct MockAuthService {
    calls: Mutex<Vec<AuthCall>>,
    user: Mutex<Option<UserIdentity>>,
    exchange_error: Option<String>,
    get_user_error: Option<String>,
    sign_out_error: Option<String>,
    events: broadcast::Sender<AuthChangeEvent>,
}

impl Default for MockAuthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAuthService {
    /// Signed out, every call succeeds
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            calls: Mutex::new(Vec::new()),
            user: Mutex::new(None),
            exchange_error: None,
            get_user_error: None,
            sign_out_error: None,
            events,
        }
    }

    /// Start with an existing session for `user`
    pub fn signed_in(self, user: UserIdentity) -> Self {
        *self.user.lock().unwrap() = Some(user);
        self
    }

    pub fn failing_exchange(mut self, message: &str) -> Self {
        self.exchange_error = Some(message.to_string());
        self
    }

    pub fn failing_get_user(mut self, message: &str) -> Self {
        self.get_user_error = Some(message.to_string());
        self
    }

    pub fn failing_sign_out(mut self, message: &str) -> Self {
        self.sign_out_error = Some(message.to_string());
        self
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<AuthCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Simulate a session change made outside this process
    pub fn emit(&self, event: AuthChangeEvent) {
        *self.user.lock().unwrap() = event.session().map(|s| s.user.clone());
        let _ = self.events.send(event);
    }

    fn record(&self, call: AuthCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn establish(&self) -> Session {
        let session = test_session(test_user());
        self.emit(AuthChangeEvent::SignedIn(session.clone()));
        session
    }
}

#[async_trait]
impl AuthService for MockAuthService {
    async fn get_user(&self) -> Result<Option<UserIdentity>, AuthError> {
        self.record(AuthCall::GetUser);
        if let Some(message) = &self.get_user_error {
            return Err(rejection(message));
        }
        Ok(self.user.lock().unwrap().clone())
    }

    async fn session(&self) -> Result<Option<Session>, AuthError> {
        self.record(AuthCall::Session);
        Ok(self.user.lock().unwrap().clone().map(test_session))
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError> {
        self.record(AuthCall::ExchangeCode(code.to_string()));
        if let Some(message) = &self.exchange_error {
            return Err(rejection(message));
        }
        Ok(self.establish())
    }

    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, AuthError> {
        self.record(AuthCall::SetSession {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        });
        Ok(self.establish())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.record(AuthCall::SignOut);
        if let Some(message) = &self.sign_out_error {
            return Err(rejection(message));
        }
        self.emit(AuthChangeEvent::SignedOut);
        Ok(())
    }

    async fn sign_in_with_redirect(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<Url, AuthError> {
        self.record(AuthCall::SignInWithRedirect {
            provider,
            redirect_to: redirect_to.to_string(),
        });
        let mut url = Url::parse("https://auth.test/authorize").map_err(|e| {
            AuthError::Configuration(e.to_string())
        })?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to);
        Ok(url)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChangeEvent> {
        self.events.subscribe()
    }
}
