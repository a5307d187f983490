//! Append-only log of generated results and their revision links.
//!
//! The log is owned by the caller (one per session or per user) and can be
//! persisted as a JSON array.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lexdraft_core::GeneratedResult;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("cannot access history file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no history entry {0}")]
    UnknownEntry(Uuid),

    #[error("duplicate history entry {0}")]
    Duplicate(Uuid),
}

#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<GeneratedResult>,
    positions: HashMap<Uuid, usize>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result. A revision must point at an entry already in the log.
    pub fn push(&mut self, result: GeneratedResult) -> Result<(), HistoryError> {
        if self.positions.contains_key(&result.id) {
            return Err(HistoryError::Duplicate(result.id));
        }
        if let Some(parent) = result.revises {
            if !self.positions.contains_key(&parent) {
                return Err(HistoryError::UnknownEntry(parent));
            }
        }
        self.positions.insert(result.id, self.entries.len());
        self.entries.push(result);
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<&GeneratedResult> {
        self.positions.get(&id).map(|&i| &self.entries[i])
    }

    pub fn latest(&self) -> Option<&GeneratedResult> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The results leading to `id`, oldest first, ending with `id` itself.
    pub fn revision_chain(&self, id: Uuid) -> Result<Vec<&GeneratedResult>, HistoryError> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let entry = self.get(id).ok_or(HistoryError::UnknownEntry(id))?;
            chain.push(entry);
            current = entry.revises;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Number of revisions between `id` and its original result.
    pub fn revision_depth(&self, id: Uuid) -> Result<usize, HistoryError> {
        Ok(self.revision_chain(id)?.len() - 1)
    }

    /// Write the log to `path` as a JSON array.
    pub fn persist(&self, path: &Path) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| HistoryError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| HistoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(entries = self.entries.len(), path = %path.display(), "persisted history");
        Ok(())
    }

    /// Read a log written by [`HistoryLog::persist`]. A missing file is an empty log.
    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let entries: Vec<GeneratedResult> = serde_json::from_str(&json)?;
        let mut log = Self::new();
        for entry in entries {
            log.push(entry)?;
        }
        Ok(log)
    }
}
