mod state;

pub use state::{reduce, AuthEvent, AuthState};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

use crate::client::Settings;
use crate::common::OAuthProvider;
use crate::error::AuthError;
use crate::finalizer::{History, SessionFinalizer};
use crate::service::AuthService;

/// Owner of the shared [`AuthState`] for one view tree.
///
/// Created by the application and handed to whatever needs auth state.
/// [`AuthProvider::mount`] runs the finalize-then-fetch sequence once and
/// starts listening for session changes; [`AuthProvider::teardown`] (or drop)
/// stops the listener. Results that arrive after teardown are discarded.
pub struct AuthProvider<S: AuthService> {
    service: Arc<S>,
    finalizer: SessionFinalizer,
    redirect_url: String,
    state: Arc<watch::Sender<AuthState>>,
    alive: CancellationToken,
    mounted: AtomicBool,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<S: AuthService> AuthProvider<S> {
    pub fn new(service: Arc<S>, settings: &Settings) -> Self {
        let (state, _) = watch::channel(AuthState::default());

        Self {
            service,
            finalizer: SessionFinalizer::new(settings.callback_path.clone()),
            redirect_url: settings.redirect_url(),
            state: Arc::new(state),
            alive: CancellationToken::new(),
            mounted: AtomicBool::new(false),
            listener: Mutex::new(None),
        }
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Current state snapshot
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn is_alive(&self) -> bool {
        !self.alive.is_cancelled()
    }

    /// Run the page-load sequence: finalize any redirect, then fetch the user.
    ///
    /// Runs at most once per provider, and never after teardown. Failures end
    /// up in [`AuthState::error`]; the only errors returned are about the
    /// provider's lifecycle.
    pub async fn mount(&self, history: &dyn History) -> Result<(), AuthError> {
        if self.alive.is_cancelled() {
            return Err(AuthError::TornDown);
        }
        if self.mounted.swap(true, Ordering::SeqCst) {
            return Err(AuthError::AlreadyMounted);
        }

        self.spawn_listener();

        let span = tracing::info_span!("auth_mount", path = %history.location().path());
        self.finalize_then_fetch(history).instrument(span).await;
        Ok(())
    }

    async fn finalize_then_fetch(&self, history: &dyn History) {
        match self.finalizer.finalize(&*self.service, history).await {
            Ok(outcome) => tracing::debug!(?outcome, "Finalization done"),
            Err(e) => {
                tracing::warn!(error = %e, "Finalization failed");
                self.apply(AuthEvent::FinalizeFailed(e.to_string()));
            }
        }

        match self.service.get_user().await {
            Ok(user) => {
                tracing::info!(signed_in = user.is_some(), "Loaded current user");
                self.apply(AuthEvent::UserLoaded(user));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load current user");
                self.apply(AuthEvent::UserLoadFailed(e.to_string()));
            }
        }
    }

    /// Stop listening for session changes and wait for the listener to exit
    pub async fn teardown(&self) {
        self.alive.cancel();

        let handle = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!("Auth state listener ended abnormally: {}", e);
            }
        }
        tracing::debug!("Auth provider torn down");
    }

    /// Start a Google sign-in and return the URL to open in the browser
    pub async fn sign_in_with_google(&self) -> Result<Url, AuthError> {
        self.apply(AuthEvent::ActionStarted);

        let result = self
            .service
            .sign_in_with_redirect(OAuthProvider::Google, &self.redirect_url)
            .await;
        if let Err(e) = &result {
            self.apply(AuthEvent::ActionFailed(e.to_string()));
        }

        self.apply(AuthEvent::ActionFinished);
        result
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.apply(AuthEvent::ActionStarted);

        let result = self.service.sign_out().await;
        match &result {
            Ok(()) => self.apply(AuthEvent::SignedOut),
            Err(e) => self.apply(AuthEvent::ActionFailed(e.to_string())),
        }

        self.apply(AuthEvent::ActionFinished);
        result
    }

    fn apply(&self, event: AuthEvent) {
        if self.alive.is_cancelled() {
            tracing::trace!(?event, "Provider torn down, dropping auth event");
            return;
        }
        self.state.send_modify(|state| reduce(state, event));
    }

    fn spawn_listener(&self) {
        let mut events = self.service.subscribe();
        let state = Arc::clone(&self.state);
        let alive = self.alive.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = alive.cancelled() => break,
                    received = events.recv() => match received {
                        Ok(event) => {
                            if alive.is_cancelled() {
                                break;
                            }
                            let user = event.session().map(|session| session.user.clone());
                            tracing::debug!(signed_in = user.is_some(), "Auth state changed");
                            state.send_modify(|s| reduce(s, AuthEvent::SessionChanged(user)));
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!("Auth state listener skipped {} events", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        });

        *self.listener.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }
}

impl<S: AuthService> Drop for AuthProvider<S> {
    fn drop(&mut self) {
        self.alive.cancel();
    }
}
