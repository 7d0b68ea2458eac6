use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejection or transport failure reported by the auth service
    #[error("{0}")]
    Service(#[from] crate::client::gotrue::GoTrueError),

    /// Error description handed back by the identity provider in the redirect
    #[error("{0}")]
    Provider(String),

    #[error("No access token found in redirect URL")]
    MissingAccessToken,

    #[error("PKCE code verifier not found in storage. Please try signing in again.")]
    MissingCodeVerifier,

    #[error("Session expired and no refresh token is available")]
    MissingRefreshToken,

    #[error("Access token is not a valid JWT")]
    InvalidAccessToken,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Sign-in failed: {0}")]
    SignInFailed(String),

    #[error("Auth provider is already mounted")]
    AlreadyMounted,

    #[error("Auth provider has been torn down")]
    TornDown,
}

impl From<config::ConfigError> for AuthError {
    fn from(err: config::ConfigError) -> Self {
        AuthError::Configuration(err.to_string())
    }
}
