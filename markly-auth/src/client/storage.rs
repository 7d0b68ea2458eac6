use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::AuthError;

/// Key/value persistence for session material and the pending PKCE verifier
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, AuthError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), AuthError>;
    fn remove_item(&self, key: &str) -> Result<(), AuthError>;
}

/// One file per key under the user's cache directory, readable by the owner only
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new() -> Result<Self, AuthError> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| AuthError::Configuration("Could not find cache directory".to_string()))?
            .join("markly");
        Self::with_dir(dir)
    }

    pub fn with_dir(dir: PathBuf) -> Result<Self, AuthError> {
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| {
                AuthError::Storage(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AuthError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }

        let value = fs::read_to_string(&path)
            .map_err(|e| AuthError::Storage(format!("Failed to read {}: {}", key, e)))?;
        Ok(Some(value))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let path = self.path(key);
        fs::write(&path, value)
            .map_err(|e| AuthError::Storage(format!("Failed to write {}: {}", key, e)))?;

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)
                .map_err(|e| {
                    AuthError::Storage(format!("Failed to get file permissions: {}", e))
                })?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms).map_err(|e| {
                AuthError::Storage(format!("Failed to set file permissions: {}", e))
            })?;
        }

        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), AuthError> {
        let path = self.path(key);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| AuthError::Storage(format!("Failed to delete {}: {}", key, e)))?;
        }
        Ok(())
    }
}

/// Process-local storage, used by tests and one-shot commands
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AuthError> {
        self.items
            .lock()
            .map_err(|_| AuthError::Storage("Memory storage lock poisoned".to_string()))
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), AuthError> {
        self.items()?.remove(key);
        Ok(())
    }
}
