use async_trait::async_trait;
use tokio::sync::broadcast;
use url::Url;

use crate::common::{AuthChangeEvent, OAuthProvider, Session, UserIdentity};
use crate::error::AuthError;

/// Operations the application needs from the external auth service.
///
/// Every call resolves to either a value or an error. Session changes made
/// through any of these calls (and token refreshes done internally) are
/// announced on the stream returned by [`AuthService::subscribe`].
#[async_trait]
pub trait AuthService: Send + Sync + 'static {
    /// The user behind the current session, `None` when signed out
    async fn get_user(&self) -> Result<Option<UserIdentity>, AuthError>;

    /// The current session, refreshed first if it has expired
    async fn session(&self) -> Result<Option<Session>, AuthError>;

    /// Authorization code flow: trade a redirect `code` for a session
    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError>;

    /// Implicit flow: adopt tokens handed back in the redirect fragment
    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Prepare a provider sign-in and return the URL to send the browser to
    async fn sign_in_with_redirect(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<Url, AuthError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthChangeEvent>;
}
