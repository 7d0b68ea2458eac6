mod models;

pub use models::{AuthChangeEvent, OAuthProvider, Session, StoredSession, UserIdentity};
