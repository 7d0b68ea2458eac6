use super::{Equals, OrderBy};
use crate::macros::setter;
use crate::request::{EmptyResponse, Method, Request, RequestData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;

const TABLE: &str = "/bookmarks";

// Common

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub url: String,
    pub tag: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Requests

/// All bookmarks of one user, newest first by default
#[derive(Debug, Clone, Serialize)]
pub struct ListBookmarks {
    select: String,
    user_id: Equals<Uuid>,
    order: OrderBy,
}

impl ListBookmarks {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            select: "*".to_string(),
            user_id: Equals(user_id),
            order: OrderBy::descending("created_at"),
        }
    }

    setter!(order: OrderBy);
}

impl Request for ListBookmarks {
    type Data = Self;
    type Response = Vec<Bookmark>;

    fn endpoint(&self) -> Cow<'_, str> {
        TABLE.into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateBookmark {
    bookmark: NewBookmark,
}

impl CreateBookmark {
    pub fn new(user_id: Uuid, title: &str, url: &str) -> Self {
        Self {
            bookmark: NewBookmark::new(user_id, title, url),
        }
    }

    setter!(bookmark.tag: Option<String>);
}

impl Request for CreateBookmark {
    type Data = NewBookmark;
    type Response = Vec<Bookmark>;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        TABLE.into()
    }

    fn data(&self) -> RequestData<&NewBookmark> {
        RequestData::Json(&self.bookmark)
    }

    fn prefer(&self) -> Option<&'static str> {
        Some("return=representation")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookmark {
    pub user_id: Uuid,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl NewBookmark {
    pub fn new(user_id: Uuid, title: &str, url: &str) -> Self {
        Self {
            user_id,
            title: title.trim().to_string(),
            url: url.trim().to_string(),
            tag: None,
        }
    }
}

/// Delete one bookmark, scoped to its owner
#[derive(Debug, Clone, Serialize)]
pub struct DeleteBookmark {
    id: Equals<Uuid>,
    user_id: Equals<Uuid>,
}

impl DeleteBookmark {
    pub fn new(id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Equals(id),
            user_id: Equals(user_id),
        }
    }
}

impl Request for DeleteBookmark {
    type Data = Self;
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        TABLE.into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }
}
