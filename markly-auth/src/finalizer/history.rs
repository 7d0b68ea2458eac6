use std::sync::Mutex;
use url::Url;

/// Browser-style session history: the current location and a way to replace
/// it without navigating
pub trait History: Send + Sync {
    fn location(&self) -> Url;
    fn replace_state(&self, url: Url);
}

/// History kept in memory, for terminal sessions and tests
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<Vec<Url>>,
}

impl MemoryHistory {
    pub fn new(location: Url) -> Self {
        Self {
            entries: Mutex::new(vec![location]),
        }
    }

    /// Snapshot of every entry, oldest first
    pub fn entries(&self) -> Vec<Url> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl History for MemoryHistory {
    fn location(&self) -> Url {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries[entries.len() - 1].clone()
    }

    fn replace_state(&self, url: Url) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let last = entries.len() - 1;
        entries[last] = url;
    }
}
