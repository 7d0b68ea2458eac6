//! Bookmark list of the signed-in user.

use async_trait::async_trait;
use markly_api::endpoints::bookmarks::Bookmark;
use markly_api::{Client, MarklyApiError, Request};
use markly_auth::Session;
use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

/// Tags a new bookmark is filed under when none is given
pub const SAMPLE_TAGS: [&str; 5] = ["Design", "Product", "Inspiration", "Tools", "Reading"];

const URL_DISPLAY_LEN: usize = 40;

/// Row-level access to the bookmarks table, always on behalf of a session
#[async_trait]
pub trait BookmarkStore: Send + Sync + 'static {
    async fn list(&self, session: &Session) -> Result<Vec<Bookmark>, MarklyApiError>;

    async fn create(
        &self,
        session: &Session,
        title: &str,
        url: &str,
        tag: &str,
    ) -> Result<Vec<Bookmark>, MarklyApiError>;

    async fn delete(&self, session: &Session, id: Uuid) -> Result<(), MarklyApiError>;
}

#[async_trait]
impl BookmarkStore for Client {
    async fn list(&self, session: &Session) -> Result<Vec<Bookmark>, MarklyApiError> {
        let request = Request::bookmarks(session.user.id).list();
        self.send_as(&session.access_token, request).await
    }

    async fn create(
        &self,
        session: &Session,
        title: &str,
        url: &str,
        tag: &str,
    ) -> Result<Vec<Bookmark>, MarklyApiError> {
        let request = Request::bookmarks(session.user.id)
            .create(title, url)
            .tag(Some(tag.to_string()));
        self.send_as(&session.access_token, request).await
    }

    async fn delete(&self, session: &Session, id: Uuid) -> Result<(), MarklyApiError> {
        let request = Request::bookmarks(session.user.id).delete(id);
        self.send_as(&session.access_token, request).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarksState {
    pub bookmarks: Vec<Bookmark>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Keeps the visible list in step with the store for whoever is signed in.
///
/// Every operation flips `loading` for its duration and leaves a failure
/// message in `error`; the failure is also returned to the caller.
pub struct BookmarkBoard<B: BookmarkStore> {
    store: Arc<B>,
    session: Option<Session>,
    hero_tag: &'static str,
    state: BookmarksState,
}

impl<B: BookmarkStore> BookmarkBoard<B> {
    pub fn new(store: Arc<B>) -> Self {
        let hero_tag = SAMPLE_TAGS[rand::rng().random_range(0..SAMPLE_TAGS.len())];
        Self {
            store,
            session: None,
            hero_tag,
            state: BookmarksState::default(),
        }
    }

    /// Fix the tag new bookmarks get when none is given
    pub fn with_hero_tag(mut self, tag: &'static str) -> Self {
        self.hero_tag = tag;
        self
    }

    pub fn hero_tag(&self) -> &'static str {
        self.hero_tag
    }

    pub fn state(&self) -> &BookmarksState {
        &self.state
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.state.bookmarks
    }

    /// Switch to another session (or none) and reload
    pub async fn set_session(&mut self, session: Option<Session>) -> Result<(), MarklyApiError> {
        self.session = session;
        self.load().await
    }

    pub async fn load(&mut self) -> Result<(), MarklyApiError> {
        let Some(session) = self.session.clone() else {
            self.state.bookmarks.clear();
            return Ok(());
        };

        self.state.loading = true;
        let result = self.store.list(&session).await;
        self.state.loading = false;

        match result {
            Ok(bookmarks) => {
                tracing::debug!("Loaded {} bookmarks", bookmarks.len());
                self.state.bookmarks = bookmarks;
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Save a bookmark and reload. Returns `false` without touching the store
    /// when the title or url is blank or nobody is signed in.
    pub async fn add(
        &mut self,
        title: &str,
        url: &str,
        tag: Option<&str>,
    ) -> Result<bool, MarklyApiError> {
        let (title, url) = (title.trim(), url.trim());
        if title.is_empty() || url.is_empty() {
            return Ok(false);
        }
        let Some(session) = self.session.clone() else {
            return Ok(false);
        };

        self.state.loading = true;
        self.state.error = None;
        let tag = tag.unwrap_or(self.hero_tag);
        let result = self.store.create(&session, title, url, tag).await;
        self.state.loading = false;

        match result {
            Ok(_) => {
                tracing::info!(tag, "Bookmark saved");
                self.load().await?;
                Ok(true)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Delete one of the user's bookmarks and reload
    pub async fn delete(&mut self, id: Uuid) -> Result<bool, MarklyApiError> {
        let Some(session) = self.session.clone() else {
            return Ok(false);
        };

        self.state.loading = true;
        self.state.error = None;
        let result = self.store.delete(&session, id).await;
        self.state.loading = false;

        match result {
            Ok(()) => {
                tracing::info!(%id, "Bookmark deleted");
                self.load().await?;
                Ok(true)
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail<T>(&mut self, error: MarklyApiError) -> Result<T, MarklyApiError> {
        tracing::warn!(error = %error, "Bookmark request failed");
        self.state.error = Some(error.to_string());
        Err(error)
    }
}

/// Shorten a url for display, keeping the first `max_len` characters
pub fn truncate_url(url: &str, max_len: usize) -> String {
    match url.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &url[..cut]),
        None => url.to_string(),
    }
}

/// `truncate_url` at the width the list view uses
pub fn display_url(url: &str) -> String {
    truncate_url(url, URL_DISPLAY_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_url_keeps_short_urls() {
        assert_eq!(truncate_url("https://a.dev", 40), "https://a.dev");

        let exact = "x".repeat(40);
        assert_eq!(truncate_url(&exact, 40), exact);
    }

    #[test]
    fn test_truncate_url_cuts_long_urls() {
        let url = format!("https://example.com/{}", "a".repeat(40));
        let shown = display_url(&url);

        assert_eq!(shown.len(), 43);
        assert!(shown.starts_with("https://example.com/aaaa"));
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_truncate_url_counts_characters() {
        assert_eq!(truncate_url("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_hero_tag_is_a_sample_tag() {
        let board = BookmarkBoard::new(Arc::new(crate::testing::InMemoryBookmarks::new()));
        assert!(SAMPLE_TAGS.contains(&board.hero_tag()));
    }
}
