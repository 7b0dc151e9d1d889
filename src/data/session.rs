//! Per-session operator state: run counter and notice dismissals.
//!
//! Backed by a small JSON file, or kept purely in memory for tests and
//! headless use. Anything unreadable is treated as an empty session (run id
//! 0, nothing dismissed) — a corrupt store must never take the console down.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionState {
    #[serde(default)]
    run_id: u64,
    #[serde(default)]
    dismissed: HashMap<String, bool>,
}

/// Session-lifetime key-value store.
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    state: SessionState,
}

impl SessionStore {
    /// Purely in-memory store.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: SessionState::default(),
        }
    }

    /// File-backed store. A missing or corrupt file yields the empty
    /// session rather than an error.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let state = match std::fs::read_to_string(&path) {
            Ok(txt) => match serde_json::from_str(&txt) {
                Ok(state) => state,
                Err(e) => {
                    log::warn!(
                        "session store {} unreadable ({e}), starting empty",
                        path.display()
                    );
                    SessionState::default()
                }
            },
            Err(_) => SessionState::default(),
        };
        Self {
            path: Some(path),
            state,
        }
    }

    /// Current run id. 0 until the first run of the session starts.
    pub fn run_id(&self) -> u64 {
        self.state.run_id
    }

    /// Increment the run id and persist it. Called once per start command
    /// the backend acknowledged.
    pub fn begin_run(&mut self) -> u64 {
        self.state.run_id += 1;
        if let Err(e) = self.save() {
            log::warn!("failed to persist run id: {e}");
        }
        self.state.run_id
    }

    /// Whether a notice key was acknowledged this session.
    pub fn is_dismissed(&self, key: &str) -> bool {
        self.state.dismissed.get(key).copied().unwrap_or(false)
    }

    /// Record an acknowledged notice key.
    pub fn set_dismissed(&mut self, key: &str) -> Result<(), String> {
        self.state.dismissed.insert(key.to_string(), true);
        self.save()
    }

    /// Number of recorded dismissals (all runs of this session).
    pub fn dismissed_count(&self) -> usize {
        self.state.dismissed.len()
    }

    /// Forget everything: fresh session.
    pub fn clear(&mut self) -> Result<(), String> {
        self.state = SessionState::default();
        self.save()
    }

    fn save(&self) -> Result<(), String> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let txt = serde_json::to_string_pretty(&self.state).map_err(|e| e.to_string())?;
        std::fs::write(path, txt).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_starts_empty() {
        let store = SessionStore::in_memory();
        assert_eq!(store.run_id(), 0);
        assert!(!store.is_dismissed("0:run-complete:done"));
        assert_eq!(store.dismissed_count(), 0);
    }

    #[test]
    fn begin_run_increments() {
        let mut store = SessionStore::in_memory();
        assert_eq!(store.begin_run(), 1);
        assert_eq!(store.begin_run(), 2);
        assert_eq!(store.run_id(), 2);
    }

    #[test]
    fn dismissals_are_per_key() {
        let mut store = SessionStore::in_memory();
        store.set_dismissed("1:run-aborted:x").unwrap();
        assert!(store.is_dismissed("1:run-aborted:x"));
        assert!(!store.is_dismissed("2:run-aborted:x"));
        assert!(!store.is_dismissed("1:run-aborted:y"));
    }

    #[test]
    fn clear_resets_everything() {
        let mut store = SessionStore::in_memory();
        store.begin_run();
        store.set_dismissed("1:device:usb").unwrap();
        store.clear().unwrap();
        assert_eq!(store.run_id(), 0);
        assert_eq!(store.dismissed_count(), 0);
    }
}
