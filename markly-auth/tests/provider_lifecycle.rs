use async_trait::async_trait;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use markly_auth::testing::{test_session, test_user, AuthCall, MockAuthService};
use markly_auth::{
    AuthChangeEvent, AuthError, AuthProvider, AuthService, AuthState, History, MemoryHistory,
    OAuthProvider, Session, Settings, UserIdentity,
};
use tokio::sync::{broadcast, watch};
use url::Url;
use uuid::Uuid;

fn settings() -> Settings {
    Settings {
        supabase_url: "https://project.supabase.co".to_string(),
        anon_key: "anon".to_string(),
        site_url: "http://localhost:3000".to_string(),
        callback_path: "/auth/callback".to_string(),
    }
}

fn provider(service: MockAuthService) -> (Arc<MockAuthService>, AuthProvider<MockAuthService>) {
    let service = Arc::new(service);
    let provider = AuthProvider::new(service.clone(), &settings());
    (service, provider)
}

fn history(url: &str) -> MemoryHistory {
    MemoryHistory::new(Url::parse(url).unwrap())
}

fn other_user() -> UserIdentity {
    UserIdentity {
        id: Uuid::from_u128(42),
        email: Some("grace@example.com".to_string()),
        display_name: Some("Grace Hopper".to_string()),
    }
}

/// History that records what had happened when the URL was rewritten
struct RecordingHistory {
    inner: MemoryHistory,
    service: Arc<MockAuthService>,
    auth: watch::Receiver<AuthState>,
    rewrites: Mutex<Vec<(Url, Vec<AuthCall>, bool)>>,
}

impl History for RecordingHistory {
    fn location(&self) -> Url {
        self.inner.location()
    }

    fn replace_state(&self, url: Url) {
        self.rewrites.lock().unwrap().push((
            url.clone(),
            self.service.calls(),
            self.auth.borrow().loading,
        ));
        self.inner.replace_state(url);
    }
}

/// Service that notes the provider's `loading` flag on every call it receives
struct LoadingTracker {
    inner: Arc<MockAuthService>,
    auth: OnceLock<watch::Receiver<AuthState>>,
    seen: Mutex<Vec<bool>>,
}

impl LoadingTracker {
    fn new(inner: MockAuthService) -> Self {
        Self {
            inner: Arc::new(inner),
            auth: OnceLock::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn note(&self) {
        if let Some(auth) = self.auth.get() {
            self.seen.lock().unwrap().push(auth.borrow().loading);
        }
    }
}

#[async_trait]
impl AuthService for LoadingTracker {
    async fn get_user(&self) -> Result<Option<UserIdentity>, AuthError> {
        self.note();
        self.inner.get_user().await
    }

    async fn session(&self) -> Result<Option<Session>, AuthError> {
        self.note();
        self.inner.session().await
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError> {
        self.note();
        self.inner.exchange_code_for_session(code).await
    }

    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, AuthError> {
        self.note();
        self.inner.set_session(access_token, refresh_token).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.note();
        self.inner.sign_out().await
    }

    async fn sign_in_with_redirect(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<Url, AuthError> {
        self.note();
        self.inner.sign_in_with_redirect(provider, redirect_to).await
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChangeEvent> {
        self.inner.subscribe()
    }
}

#[tokio::test]
async fn test_code_redirect_exchanges_then_rewrites_then_fetches() {
    let (service, provider) = provider(MockAuthService::new());
    let recording = RecordingHistory {
        inner: history("http://localhost:3000/?code=VALID"),
        service: service.clone(),
        auth: provider.watch(),
        rewrites: Mutex::new(Vec::new()),
    };

    assert!(provider.state().loading);
    provider.mount(&recording).await.unwrap();

    let rewrites = recording.rewrites.lock().unwrap().clone();
    assert_eq!(rewrites.len(), 1);
    let (url, calls_at_rewrite, loading_at_rewrite) = &rewrites[0];
    assert_eq!(url.as_str(), "http://localhost:3000/");
    assert_eq!(
        calls_at_rewrite,
        &vec![AuthCall::ExchangeCode("VALID".to_string())]
    );
    assert!(loading_at_rewrite);

    assert_eq!(
        service.calls(),
        vec![AuthCall::ExchangeCode("VALID".to_string()), AuthCall::GetUser]
    );

    let state = provider.state();
    assert!(!state.loading);
    assert_eq!(state.user, Some(test_user()));
    assert_eq!(state.error, None);
    assert_eq!(recording.inner.entries().len(), 1);
}

#[tokio::test]
async fn test_fragment_tokens_establish_session() {
    let (service, provider) = provider(MockAuthService::new());
    let history = history("http://localhost:3000/#access_token=T1&refresh_token=T2");

    provider.mount(&history).await.unwrap();

    assert_eq!(
        service.calls(),
        vec![
            AuthCall::SetSession {
                access_token: "T1".to_string(),
                refresh_token: "T2".to_string(),
            },
            AuthCall::GetUser,
        ]
    );
    assert_eq!(history.location().as_str(), "http://localhost:3000/");
    assert_eq!(provider.state().user, Some(test_user()));
}

#[tokio::test]
async fn test_provider_error_in_fragment_is_surfaced() {
    let (service, provider) = provider(MockAuthService::new());
    let history = history("http://localhost:3000/#error_description=access_denied");

    provider.mount(&history).await.unwrap();

    assert_eq!(service.calls(), vec![AuthCall::GetUser]);
    let state = provider.state();
    assert_eq!(state.error.as_deref(), Some("access_denied"));
    assert_eq!(state.user, None);
    assert!(!state.loading);
}

#[tokio::test]
async fn test_plain_load_only_fetches_user() {
    let (service, provider) = provider(MockAuthService::new().signed_in(test_user()));
    let history = history("http://localhost:3000/");

    provider.mount(&history).await.unwrap();

    assert_eq!(service.calls(), vec![AuthCall::GetUser]);
    assert_eq!(
        provider.state(),
        AuthState {
            user: Some(test_user()),
            loading: false,
            error: None,
        }
    );
}

#[tokio::test]
async fn test_callback_path_skips_finalization() {
    let (service, provider) = provider(MockAuthService::new());
    let history = history("http://localhost:3000/auth/callback?code=VALID#access_token=T1");

    provider.mount(&history).await.unwrap();

    assert_eq!(service.calls(), vec![AuthCall::GetUser]);
    assert_eq!(
        history.location().as_str(),
        "http://localhost:3000/auth/callback?code=VALID#access_token=T1"
    );
}

#[tokio::test]
async fn test_failed_exchange_still_fetches_user() {
    let (service, provider) = provider(
        MockAuthService::new()
            .signed_in(other_user())
            .failing_exchange("invalid flow state, no valid flow state found"),
    );
    let history = history("http://localhost:3000/?code=STALE");

    provider.mount(&history).await.unwrap();

    assert_eq!(
        service.calls(),
        vec![AuthCall::ExchangeCode("STALE".to_string()), AuthCall::GetUser]
    );
    let state = provider.state();
    assert_eq!(
        state.error.as_deref(),
        Some("invalid flow state, no valid flow state found")
    );
    assert_eq!(state.user, Some(other_user()));
    assert!(!state.loading);
    assert_eq!(history.location().query(), Some("code=STALE"));
}

#[tokio::test]
async fn test_user_fetch_failure_ends_loading() {
    let (_service, provider) = provider(MockAuthService::new().failing_get_user("network down"));

    provider
        .mount(&history("http://localhost:3000/"))
        .await
        .unwrap();

    let state = provider.state();
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some("network down"));
}

#[tokio::test]
async fn test_mount_runs_once() {
    let (service, provider) = provider(MockAuthService::new());
    let history = history("http://localhost:3000/?code=VALID");

    provider.mount(&history).await.unwrap();
    let second = provider.mount(&history).await;

    assert!(matches!(second, Err(AuthError::AlreadyMounted)));
    assert_eq!(service.calls().len(), 2);
}

#[tokio::test]
async fn test_mount_after_teardown_is_rejected() {
    let (service, provider) = provider(MockAuthService::new());
    provider.teardown().await;

    let result = provider.mount(&history("http://localhost:3000/?code=VALID")).await;

    assert!(matches!(result, Err(AuthError::TornDown)));
    assert!(service.calls().is_empty());
    assert!(!provider.is_alive());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_loading_falls_exactly_once_during_mount() {
    let service = Arc::new(LoadingTracker::new(MockAuthService::new()));
    let provider = AuthProvider::new(service.clone(), &settings());
    assert!(service.auth.set(provider.watch()).is_ok());

    let mut observer = provider.watch();
    let initial = observer.borrow_and_update().loading;
    let observed = tokio::spawn(async move {
        let mut seen = vec![initial];
        while observer.changed().await.is_ok() {
            seen.push(observer.borrow_and_update().loading);
        }
        seen
    });

    let recording = RecordingHistory {
        inner: history("http://localhost:3000/?code=VALID"),
        service: service.inner.clone(),
        auth: provider.watch(),
        rewrites: Mutex::new(Vec::new()),
    };
    provider.mount(&recording).await.unwrap();
    assert!(!provider.state().loading);

    // Exchange and user fetch both start while loading
    assert_eq!(*service.seen.lock().unwrap(), vec![true, true]);
    let rewrites = recording.rewrites.lock().unwrap().clone();
    assert_eq!(rewrites.len(), 1);
    assert!(rewrites[0].2);

    provider.teardown().await;
    drop(recording);
    drop(provider);
    let observed = observed.await.unwrap();

    assert_eq!(observed.first(), Some(&true));
    assert_eq!(observed.last(), Some(&false));
    assert_eq!(observed.windows(2).filter(|w| w[0] && !w[1]).count(), 1);
    assert!(!observed.windows(2).any(|w| !w[0] && w[1]));
}

#[tokio::test]
async fn test_change_stream_updates_user_until_teardown() {
    let (service, provider) = provider(MockAuthService::new());
    provider
        .mount(&history("http://localhost:3000/"))
        .await
        .unwrap();
    assert_eq!(provider.state().user, None);

    let mut watcher = provider.watch();
    service.emit(AuthChangeEvent::SignedIn(test_session(other_user())));
    tokio::time::timeout(
        Duration::from_secs(1),
        watcher.wait_for(|state| state.user == Some(other_user())),
    )
    .await
    .expect("listener did not apply sign-in")
    .unwrap();

    provider.teardown().await;
    assert!(!provider.is_alive());

    service.emit(AuthChangeEvent::SignedOut);
    tokio::task::yield_now().await;
    assert_eq!(provider.state().user, Some(other_user()));
}

#[tokio::test]
async fn test_sign_in_with_google_uses_callback_redirect() {
    let (service, provider) = provider(MockAuthService::new());
    provider
        .mount(&history("http://localhost:3000/"))
        .await
        .unwrap();

    let url = provider.sign_in_with_google().await.unwrap();

    assert!(url
        .query_pairs()
        .any(|(k, v)| k == "redirect_to" && v == "http://localhost:3000/auth/callback"));
    assert_eq!(
        service.calls().last(),
        Some(&AuthCall::SignInWithRedirect {
            provider: OAuthProvider::Google,
            redirect_to: "http://localhost:3000/auth/callback".to_string(),
        })
    );
    let state = provider.state();
    assert!(!state.loading);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn test_sign_out_clears_user() {
    let (_service, provider) = provider(MockAuthService::new().signed_in(test_user()));
    provider
        .mount(&history("http://localhost:3000/"))
        .await
        .unwrap();
    assert_eq!(provider.state().user, Some(test_user()));

    provider.sign_out().await.unwrap();

    let state = provider.state();
    assert_eq!(state.user, None);
    assert!(!state.loading);
}

#[tokio::test]
async fn test_failed_sign_out_keeps_user_and_reports() {
    let (_service, provider) = provider(
        MockAuthService::new()
            .signed_in(test_user())
            .failing_sign_out("Service unavailable"),
    );
    provider
        .mount(&history("http://localhost:3000/"))
        .await
        .unwrap();

    let result = provider.sign_out().await;

    assert!(result.is_err());
    let state = provider.state();
    assert_eq!(state.user, Some(test_user()));
    assert_eq!(state.error.as_deref(), Some("Service unavailable"));
    assert!(!state.loading);
}
