pub mod gotrue;
mod config;
mod storage;
mod supabase;

pub use config::Settings;
pub use gotrue::{GoTrueClient, GoTrueError};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use supabase::SupabaseAuth;

use std::sync::Arc;

use crate::error::AuthError;

/// Load and validate settings, then build the Supabase service on file storage
pub fn connect() -> Result<(Settings, SupabaseAuth), AuthError> {
    let settings = Settings::new()?;
    settings.validate().map_err(AuthError::Configuration)?;

    let storage = Arc::new(FileStorage::new()?);
    let service = SupabaseAuth::new(&settings, storage)?;
    tracing::debug!(supabase_url = %settings.supabase_url, "Auth service configured");

    Ok((settings, service))
}
