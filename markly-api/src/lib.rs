pub mod endpoints;
mod error;
mod macros;
pub mod repositories;
pub mod request;

pub use crate::error::{ErrorDetail, MarklyApiError};
pub use reqwest::StatusCode;
use repositories::*;
use request::{Request as ApiRequest, RequestData};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

const REST_PATH: &str = "/rest/v1";

pub struct Client {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: Option<SecretString>,
}

impl Client {
    /// Anonymous client for a Supabase project; requests run as the anon role
    pub fn new(supabase_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}{}", supabase_url.trim_end_matches('/'), REST_PATH),
            api_key: api_key.to_string(),
            access_token: None,
        }
    }

    /// Run requests as the user the access token belongs to
    pub fn bearer_auth(mut self, access_token: &str) -> Self {
        self.access_token = Some(SecretString::from(access_token.to_string()));
        self
    }

    pub async fn send<R>(&self, request: R) -> Result<R::Response, MarklyApiError>
    where
        R: ApiRequest,
    {
        let bearer = match &self.access_token {
            Some(token) => token.expose_secret(),
            None => self.api_key.as_str(),
        };
        self.dispatch(bearer, request).await
    }

    /// Send one request as the given user, ignoring the client's own token
    pub async fn send_as<R>(
        &self,
        access_token: &SecretString,
        request: R,
    ) -> Result<R::Response, MarklyApiError>
    where
        R: ApiRequest,
    {
        self.dispatch(access_token.expose_secret(), request).await
    }

    async fn dispatch<R>(&self, bearer: &str, request: R) -> Result<R::Response, MarklyApiError>
    where
        R: ApiRequest,
    {
        let url = format!("{}{}", self.base_url, request.endpoint());

        let mut builder = self
            .http
            .request(R::METHOD, &url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer);

        if let Some(prefer) = request.prefer() {
            builder = builder.header("Prefer", prefer);
        }

        builder = match request.data() {
            RequestData::Empty => builder,
            RequestData::Query(query) => builder.query(query),
            RequestData::Json(body) => builder.json(body),
        };

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(MarklyApiError::from_response(status, &body));
        }

        let body = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(body).map_err(MarklyApiError::Decode)
    }
}

pub struct Request;

impl Request {
    pub fn bookmarks(user_id: Uuid) -> BookmarkRepository {
        BookmarkRepository::new(user_id)
    }
}
