mod history;
mod redirect;

pub use history::{History, MemoryHistory};
pub use redirect::{scrubbed, FragmentParams, FragmentTokens, RedirectArtifacts};

use crate::common::Session;
use crate::error::AuthError;
use crate::service::AuthService;

pub const DEFAULT_CALLBACK_PATH: &str = "/auth/callback";

/// Result of looking at a page load for OAuth redirect artifacts
#[derive(Debug)]
pub enum Finalization {
    Skipped(SkipReason),
    Established(Session),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The page is the callback route, which finalizes on its own
    CallbackRoute,
    /// Nothing in the URL came from a redirect
    NoRedirect,
}

/// Turns redirect artifacts in the current URL into a session.
///
/// On success the visible URL is replaced by its bare path so a reload does not
/// replay the code or tokens. Failures leave the URL untouched.
#[derive(Debug, Clone)]
pub struct SessionFinalizer {
    callback_path: String,
}

impl Default for SessionFinalizer {
    fn default() -> Self {
        Self::new(DEFAULT_CALLBACK_PATH)
    }
}

impl SessionFinalizer {
    pub fn new(callback_path: impl Into<String>) -> Self {
        Self {
            callback_path: callback_path.into(),
        }
    }

    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    pub async fn finalize<S>(
        &self,
        service: &S,
        history: &dyn History,
    ) -> Result<Finalization, AuthError>
    where
        S: AuthService + ?Sized,
    {
        let location = history.location();

        let session = match RedirectArtifacts::inspect(&location, &self.callback_path) {
            RedirectArtifacts::CallbackRoute => {
                tracing::debug!(path = %location.path(), "Callback route, leaving finalization to its handler");
                return Ok(Finalization::Skipped(SkipReason::CallbackRoute));
            }
            RedirectArtifacts::None => {
                return Ok(Finalization::Skipped(SkipReason::NoRedirect));
            }
            RedirectArtifacts::Denied(description) => {
                tracing::warn!(error = %description, "Provider reported sign-in failure");
                return Err(AuthError::Provider(description));
            }
            RedirectArtifacts::Code(code) => {
                tracing::info!("Finalizing sign-in from authorization code");
                exchange_code(service, &code).await?
            }
            RedirectArtifacts::Fragment(params) => {
                tracing::info!("Finalizing sign-in from URL fragment");
                let tokens = params.tokens().inspect_err(|e| {
                    tracing::warn!(error = %e, "Unusable redirect fragment");
                })?;
                service
                    .set_session(&tokens.access_token, &tokens.refresh_token)
                    .await?
            }
        };

        history.replace_state(scrubbed(&location));
        tracing::info!(user_id = %session.user.id, "Sign-in finalized");

        Ok(Finalization::Established(session))
    }
}

/// Code exchange shared by page-load finalization and the callback route
pub async fn exchange_code<S>(service: &S, code: &str) -> Result<Session, AuthError>
where
    S: AuthService + ?Sized,
{
    service.exchange_code_for_session(code).await.inspect_err(|e| {
        tracing::warn!(error = %e, "Authorization code exchange failed");
    })
}
