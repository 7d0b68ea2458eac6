use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::borrow::Cow;

pub use reqwest::Method;

/// How a request carries its payload
#[derive(Debug)]
pub enum RequestData<T> {
    Empty,
    Query(T),
    Json(T),
}

/// A typed call against the REST endpoint of the hosted database
pub trait Request {
    type Data: Serialize;
    type Response: DeserializeOwned;
    const METHOD: Method = Method::GET;

    /// Path below `/rest/v1`
    fn endpoint(&self) -> Cow<'_, str>;

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Empty
    }

    /// Value for the `Prefer` header
    fn prefer(&self) -> Option<&'static str> {
        None
    }
}

/// Response type for calls that return no body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmptyResponse;
