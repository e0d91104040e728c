//! Where the session record lives between runs.
//!
//! The store holds at most one serialized [`SessionRecord`]. Writes are
//! last-write-wins. A record that cannot be read back is discarded: [`load`]
//! clears the store and reports no session.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, warn};

use super::{Session, SessionRecord};

/// Failure to read or write the persisted record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Byte-level storage for one session record.
pub trait SessionStore: Send + Sync {
    /// The stored record text, or `None` when nothing was saved.
    fn load_raw(&self) -> Result<Option<String>, StoreError>;
    fn save_raw(&self, record: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Restore the saved session. Unreadable or corrupt records are removed.
pub fn load(store: &dyn SessionStore) -> Option<Session> {
    let raw = match store.load_raw() {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read saved session, discarding: {e}");
            discard(store);
            return None;
        }
    };

    let restored = serde_json::from_str::<SessionRecord>(&raw)
        .map_err(|e| e.to_string())
        .and_then(|record| record.into_session().map_err(|e| e.to_string()));

    match restored {
        Ok(session) => {
            debug!(
                "Restored session: puzzle={:?}, clues={}",
                session.puzzle.as_ref().map(|p| p.id.as_str()),
                session.clues.len()
            );
            Some(session)
        }
        Err(e) => {
            warn!("Saved session is corrupt, discarding: {e}");
            discard(store);
            None
        }
    }
}

/// Persist `session`, replacing whatever was stored.
pub fn save(store: &dyn SessionStore, session: &Session) -> Result<(), StoreError> {
    let json = serde_json::to_string(&session.to_record())?;
    store.save_raw(&json)
}

fn discard(store: &dyn SessionStore) {
    if let Err(e) = store.clear() {
        warn!("Failed to clear saved session: {e}");
    }
}

// ── File ───────────────────────────────────────────────────────────

/// A single JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(&self, action: &'static str, path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

impl SessionStore for FileStore {
    fn load_raw(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err("read", &self.path, e)),
        }
    }

    fn save_raw(&self, record: &str) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| self.io_err("create", dir, e))?;
        }
        let tmp = self.tmp_path();
        std::fs::write(&tmp, record).map_err(|e| self.io_err("write", &tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err("rename", &tmp, e))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err("remove", &self.path, e)),
        }
    }
}

// ── Memory ─────────────────────────────────────────────────────────

/// In-process store for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with `record`.
    pub fn with_record(record: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(record.into())),
        }
    }

    /// Current stored text.
    pub fn snapshot(&self) -> Option<String> {
        self.slot().clone()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.record.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn load_raw(&self) -> Result<Option<String>, StoreError> {
        Ok(self.slot().clone())
    }

    fn save_raw(&self, record: &str) -> Result<(), StoreError> {
        *self.slot() = Some(record.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot() = None;
        Ok(())
    }
}

impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    fn load_raw(&self) -> Result<Option<String>, StoreError> {
        (**self).load_raw()
    }

    fn save_raw(&self, record: &str) -> Result<(), StoreError> {
        (**self).save_raw(record)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}
