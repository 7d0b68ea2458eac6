//! In-memory stand-ins for the hosted store, for tests.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use markly_api::endpoints::bookmarks::Bookmark;
use markly_api::{ErrorDetail, MarklyApiError, StatusCode};
use markly_auth::Session;
use std::sync::Mutex;
use uuid::Uuid;

use crate::bookmarks::BookmarkStore;

/// One recorded call into [`InMemoryBookmarks`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List(Uuid),
    Create {
        user_id: Uuid,
        title: String,
        url: String,
        tag: String,
    },
    Delete {
        user_id: Uuid,
        id: Uuid,
    },
}

/// Bookmarks table held in memory, scoped by user like the hosted one
#[derive(Default)]
pub struct InMemoryBookmarks {
    rows: Mutex<Vec<Bookmark>>,
    calls: Mutex<Vec<StoreCall>>,
    failure: Option<String>,
    next_id: Mutex<u128>,
}

impl InMemoryBookmarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every call with `message`, as the server would with a 401
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Seed a row; later seeds are newer
    pub fn with_bookmark(self, user_id: Uuid, title: &str, url: &str, tag: &str) -> Self {
        self.insert(user_id, title, url, tag);
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn rows(&self) -> Vec<Bookmark> {
        self.rows.lock().unwrap().clone()
    }

    fn insert(&self, user_id: Uuid, title: &str, url: &str, tag: &str) -> Bookmark {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;

        let epoch = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let bookmark = Bookmark {
            id: Uuid::from_u128(*next_id),
            user_id,
            title: title.to_string(),
            url: url.to_string(),
            tag: Some(tag.to_string()),
            created_at: epoch + Duration::minutes(*next_id as i64),
        };
        self.rows.lock().unwrap().push(bookmark.clone());
        bookmark
    }

    fn check(&self, call: StoreCall) -> Result<(), MarklyApiError> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(message) => Err(MarklyApiError::Api(
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: Some("PGRST301".to_string()),
                    message: message.clone(),
                    details: None,
                    hint: None,
                },
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BookmarkStore for InMemoryBookmarks {
    async fn list(&self, session: &Session) -> Result<Vec<Bookmark>, MarklyApiError> {
        let user_id = session.user.id;
        self.check(StoreCall::List(user_id))?;

        let mut rows: Vec<Bookmark> = self
            .rows()
            .into_iter()
            .filter(|b| b.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn create(
        &self,
        session: &Session,
        title: &str,
        url: &str,
        tag: &str,
    ) -> Result<Vec<Bookmark>, MarklyApiError> {
        self.check(StoreCall::Create {
            user_id: session.user.id,
            title: title.to_string(),
            url: url.to_string(),
            tag: tag.to_string(),
        })?;
        Ok(vec![self.insert(session.user.id, title, url, tag)])
    }

    async fn delete(&self, session: &Session, id: Uuid) -> Result<(), MarklyApiError> {
        let user_id = session.user.id;
        self.check(StoreCall::Delete { user_id, id })?;

        self.rows
            .lock()
            .unwrap()
            .retain(|b| !(b.id == id && b.user_id == user_id));
        Ok(())
    }
}
