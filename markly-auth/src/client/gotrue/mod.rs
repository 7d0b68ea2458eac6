mod models;

pub use models::GoTrueError;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use models::*;
use reqwest::{Client, Response, StatusCode};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::common::{OAuthProvider, Session, UserIdentity};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Thin HTTP client for the Supabase auth (GoTrue) REST endpoints
pub struct GoTrueClient {
    http_client: Client,
    auth_url: String,
    api_key: String,
}

impl GoTrueClient {
    pub fn new(supabase_url: &str, api_key: &str) -> Result<Self, GoTrueError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            auth_url: format!("{}/auth/v1", supabase_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }

    /// Build the provider authorize URL the browser is sent to
    pub fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, GoTrueError> {
        let mut url = Url::parse(&format!("{}/authorize", self.auth_url))?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "s256");
        Ok(url)
    }

    /// Exchange an authorization code and its PKCE verifier for a session
    pub async fn exchange_pkce(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<Session, GoTrueError> {
        let url = format!("{}/token", self.auth_url);
        let req = PkceGrantRequest {
            auth_code,
            code_verifier,
        };

        let resp = self
            .http_client
            .post(&url)
            .header("apikey", &self.api_key)
            .query(&[("grant_type", "pkce")])
            .json(&req)
            .send()
            .await?;

        let tokens = parse_json::<TokenResponse>(resp).await?;
        Ok(session_from_tokens(tokens, Utc::now()))
    }

    /// Trade a refresh token for a fresh session
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, GoTrueError> {
        let url = format!("{}/token", self.auth_url);
        let req = RefreshGrantRequest { refresh_token };

        let resp = self
            .http_client
            .post(&url)
            .header("apikey", &self.api_key)
            .query(&[("grant_type", "refresh_token")])
            .json(&req)
            .send()
            .await?;

        let tokens = parse_json::<TokenResponse>(resp).await?;
        Ok(session_from_tokens(tokens, Utc::now()))
    }

    pub async fn get_user(&self, access_token: &str) -> Result<UserIdentity, GoTrueError> {
        let url = format!("{}/user", self.auth_url);

        let resp = self
            .http_client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let user = parse_json::<UserResponse>(resp).await?;
        Ok(user.into())
    }

    /// Revoke the session server side. A session the server no longer knows
    /// about counts as signed out.
    pub async fn logout(&self, access_token: &str) -> Result<(), GoTrueError> {
        let url = format!("{}/logout", self.auth_url);

        let resp = self
            .http_client
            .post(&url)
            .header("apikey", &self.api_key)
            .query(&[("scope", "global")])
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success()
            || matches!(
                status,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
            )
        {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(GoTrueError::from_body(status, &body))
    }
}

async fn parse_json<T: DeserializeOwned>(resp: Response) -> Result<T, GoTrueError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }

    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(status = %status, "Auth service rejected request");
    Err(GoTrueError::from_body(status, &body))
}

fn session_from_tokens(tokens: TokenResponse, now: DateTime<Utc>) -> Session {
    let expires_at = tokens
        .expires_at
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_else(|| now + ChronoDuration::seconds(tokens.expires_in));

    Session {
        access_token: SecretString::from(tokens.access_token),
        refresh_token: SecretString::from(tokens.refresh_token),
        expires_at,
        user: tokens.user.into(),
    }
}
