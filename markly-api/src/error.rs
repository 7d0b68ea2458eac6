use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum MarklyApiError {
    Api(StatusCode, ErrorDetail),
    Http(reqwest::Error),
    Decode(serde_json::Error),
}

impl MarklyApiError {
    /// Build from a non-success response. Bodies that are not the usual JSON
    /// error object are kept as the message.
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorDetail>(body).unwrap_or_else(|_| ErrorDetail {
            code: None,
            message: if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_string()
            } else {
                body.trim().to_string()
            },
            details: None,
            hint: None,
        });
        MarklyApiError::Api(status, detail)
    }
}

impl From<reqwest::Error> for MarklyApiError {
    fn from(value: reqwest::Error) -> Self {
        MarklyApiError::Http(value)
    }
}

impl std::fmt::Display for MarklyApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarklyApiError::Http(e) => write!(f, "HTTP error: {}", e),
            MarklyApiError::Decode(e) => write!(f, "Unexpected response: {}", e),
            MarklyApiError::Api(_, detail) => f.write_str(&detail.message),
        }
    }
}

impl std::error::Error for MarklyApiError {}

/// Error object returned by the REST endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: String,
    pub details: Option<String>,
    pub hint: Option<String>,
}
