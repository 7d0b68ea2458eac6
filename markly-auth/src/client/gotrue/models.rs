use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::UserIdentity;

// POST /auth/v1/token?grant_type=pkce
#[derive(Debug, Serialize)]
pub struct PkceGrantRequest<'a> {
    pub auth_code: &'a str,
    pub code_verifier: &'a str,
}

// POST /auth/v1/token?grant_type=refresh_token
#[derive(Debug, Serialize)]
pub struct RefreshGrantRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub expires_at: Option<i64>,
    pub user: UserResponse,
}

// GET /auth/v1/user
#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserMetadata {
    pub full_name: Option<String>,
    pub name: Option<String>,
}

impl From<UserResponse> for UserIdentity {
    fn from(user: UserResponse) -> Self {
        let email = user.email.filter(|e| !e.is_empty());
        Self {
            id: user.id,
            email,
            display_name: user.user_metadata.full_name.or(user.user_metadata.name),
        }
    }
}

/// Error payloads come in a few shapes depending on the endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub msg: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

#[derive(Debug)]
pub enum GoTrueError {
    Http(reqwest::Error),
    InvalidUrl(url::ParseError),
    Api { status: u16, message: String },
}

impl GoTrueError {
    pub(crate) fn from_body(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unexpected response from auth service")
                    .to_string()
            });

        Self::Api {
            status: status.as_u16(),
            message,
        }
    }
}

impl std::fmt::Display for GoTrueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::InvalidUrl(e) => write!(f, "Invalid auth URL: {}", e),
            Self::Api { message, .. } => f.write_str(message),
        }
    }
}

impl std::error::Error for GoTrueError {}

impl From<reqwest::Error> for GoTrueError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

impl From<url::ParseError> for GoTrueError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_prefers_description() {
        let err = GoTrueError::from_body(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token"}"#,
        );
        assert_eq!(err.to_string(), "Invalid Refresh Token");
    }

    #[test]
    fn test_error_reads_msg_shape() {
        let err = GoTrueError::from_body(
            reqwest::StatusCode::NOT_FOUND,
            r#"{"code":404,"msg":"invalid flow state, no valid flow state found"}"#,
        );
        assert_eq!(
            err.to_string(),
            "invalid flow state, no valid flow state found"
        );
    }

    #[test]
    fn test_error_falls_back_to_status_reason() {
        let err = GoTrueError::from_body(reqwest::StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(err.to_string(), "Bad Gateway");
        assert!(matches!(err, GoTrueError::Api { status: 502, .. }));
    }

    #[test]
    fn test_display_name_falls_back_to_name() {
        let user: UserResponse = serde_json::from_str(
            r#"{"id":"5c1b2c56-4a0e-4f8c-9b1a-2f4e8d7c6b5a","email":"","user_metadata":{"name":"Ada"}}"#,
        )
        .unwrap();
        let identity = UserIdentity::from(user);
        assert_eq!(identity.email, None);
        assert_eq!(identity.display_name.as_deref(), Some("Ada"));
    }
}
