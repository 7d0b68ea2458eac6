mod handlers;
mod pages;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::client::Settings;
use crate::common::UserIdentity;
use crate::error::AuthError;
use crate::service::AuthService;

type SignInResult = Result<UserIdentity, String>;

#[derive(Clone)]
pub(crate) struct ListenerState {
    service: Arc<dyn AuthService>,
    outcome: Arc<Outcome>,
}

/// Result of the one sign-in attempt the listener serves
struct Outcome {
    stashed: Mutex<Option<UserIdentity>>,
    sender: Mutex<Option<oneshot::Sender<SignInResult>>>,
}

impl Outcome {
    fn stash(&self, user: UserIdentity) {
        *self.stashed.lock().unwrap_or_else(|e| e.into_inner()) = Some(user);
    }

    fn take_stashed(&self) -> Option<UserIdentity> {
        self.stashed.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    /// Only the first result is delivered
    fn finish(&self, result: SignInResult) {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(sender) = sender {
            if sender.send(result).is_err() {
                tracing::debug!("Nobody waiting for the sign-in result");
            }
        }
    }
}

/// Local HTTP receiver for the provider redirect.
///
/// Serves the callback route (code exchange, then redirect to `/`) and the
/// home page that confirms the sign-in, then shuts down once [`wait`] has
/// the result.
///
/// [`wait`]: CallbackListener::wait
pub struct CallbackListener {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    outcome: oneshot::Receiver<SignInResult>,
    server: JoinHandle<std::io::Result<()>>,
}

impl CallbackListener {
    /// Bind to the host and port of the configured site URL
    pub async fn bind(
        service: Arc<dyn AuthService>,
        settings: &Settings,
    ) -> Result<Self, AuthError> {
        let site = Url::parse(&settings.site_url)
            .map_err(|e| AuthError::Configuration(format!("Invalid site_url: {}", e)))?;
        let host = site
            .host_str()
            .ok_or_else(|| AuthError::Configuration("site_url has no host".to_string()))?;
        let port = site
            .port_or_known_default()
            .ok_or_else(|| AuthError::Configuration("site_url has no port".to_string()))?;

        let listener = TcpListener::bind((host, port)).await?;
        Self::serve(listener, service, &settings.callback_path)
    }

    pub fn serve(
        listener: TcpListener,
        service: Arc<dyn AuthService>,
        callback_path: &str,
    ) -> Result<Self, AuthError> {
        let local_addr = listener.local_addr()?;
        let (sender, outcome) = oneshot::channel();

        let state = ListenerState {
            service,
            outcome: Arc::new(Outcome {
                stashed: Mutex::new(None),
                sender: Mutex::new(Some(sender)),
            }),
        };

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        let app = router(state, callback_path);
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
        });

        tracing::info!("Listening for sign-in redirect on {}", local_addr);

        Ok(Self {
            local_addr,
            shutdown,
            outcome,
            server,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the redirect to be handled, then stop serving
    pub async fn wait(self) -> Result<UserIdentity, AuthError> {
        let result = self.outcome.await;

        self.shutdown.cancel();
        match self.server.await {
            Ok(Ok(())) => tracing::debug!("Callback listener stopped"),
            Ok(Err(e)) => tracing::warn!("Callback listener failed: {}", e),
            Err(e) => tracing::warn!("Callback listener task ended abnormally: {}", e),
        }

        match result {
            Ok(Ok(user)) => Ok(user),
            Ok(Err(message)) => Err(AuthError::SignInFailed(message)),
            Err(_) => Err(AuthError::SignInFailed(
                "Callback listener stopped before sign-in completed".to_string(),
            )),
        }
    }
}

fn router(state: ListenerState, callback_path: &str) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route(callback_path, get(handlers::oauth_callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
