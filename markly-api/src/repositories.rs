use crate::endpoints::bookmarks::{CreateBookmark, DeleteBookmark, ListBookmarks};
use uuid::Uuid;

/// Requests scoped to the bookmarks of one user
pub struct BookmarkRepository {
    user_id: Uuid,
}

impl BookmarkRepository {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    pub fn list(&self) -> ListBookmarks {
        ListBookmarks::new(self.user_id)
    }

    pub fn create(&self, title: &str, url: &str) -> CreateBookmark {
        CreateBookmark::new(self.user_id, title, url)
    }

    pub fn delete(&self, id: Uuid) -> DeleteBookmark {
        DeleteBookmark::new(id, self.user_id)
    }
}
