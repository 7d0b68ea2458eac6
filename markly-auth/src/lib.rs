// Types shared by the service, finalizer and provider
pub mod common;

// Auth service client (public API for markly)
mod client;
mod error;
pub mod finalizer;
pub mod provider;
mod service;

pub use client::{
    connect, FileStorage, GoTrueClient, GoTrueError, MemoryStorage, Settings, Storage,
    SupabaseAuth,
};
pub use common::{AuthChangeEvent, OAuthProvider, Session, UserIdentity};
pub use error::AuthError;
pub use finalizer::{Finalization, History, MemoryHistory, SessionFinalizer, SkipReason};
pub use provider::{AuthProvider, AuthState};
pub use service::AuthService;

// Loopback receiver for the provider redirect
#[cfg(feature = "listener")]
pub mod listener;

// Always expose testing module (downstream tests need it)
pub mod testing;
