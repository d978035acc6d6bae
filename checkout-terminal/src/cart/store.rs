//! Durable cart snapshot
//!
//! The cart survives a terminal restart: every mutation rewrites the snapshot,
//! startup reads it once, and clearing the cart deletes it.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use shared::models::CartLine;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the cart snapshot lives
pub trait CartStore: Send + Sync {
    /// Lines from the last snapshot, empty when there is none
    fn load(&self) -> Result<Vec<CartLine>, StoreError>;

    fn save(&self, lines: &[CartLine]) -> Result<(), StoreError>;

    /// Forget the snapshot entirely
    fn discard(&self) -> Result<(), StoreError>;
}

/// Snapshot as a JSON array of cart lines on disk
#[derive(Debug, Clone)]
pub struct JsonFileCartStore {
    file_path: PathBuf,
}

impl JsonFileCartStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn tmp_path(&self) -> PathBuf {
        self.file_path.with_extension("json.tmp")
    }
}

impl CartStore for JsonFileCartStore {
    fn load(&self) -> Result<Vec<CartLine>, StoreError> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.file_path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), StoreError> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write-then-rename so a crash never leaves a half-written snapshot
        let content = serde_json::to_string_pretty(lines)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.file_path)?;
        Ok(())
    }

    fn discard(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process snapshot, for tests and for running without a work dir
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    lines: Mutex<Option<Vec<CartLine>>>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a snapshot as if a previous run had saved it
    pub fn with_lines(lines: Vec<CartLine>) -> Self {
        Self {
            lines: Mutex::new(Some(lines)),
        }
    }

    /// Current snapshot, `None` once discarded or never written
    pub fn snapshot(&self) -> Option<Vec<CartLine>> {
        self.lines.lock().clone()
    }
}

impl CartStore for MemoryCartStore {
    fn load(&self) -> Result<Vec<CartLine>, StoreError> {
        Ok(self.lines.lock().clone().unwrap_or_default())
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), StoreError> {
        *self.lines.lock() = Some(lines.to_vec());
        Ok(())
    }

    fn discard(&self) -> Result<(), StoreError> {
        *self.lines.lock() = None;
        Ok(())
    }
}
