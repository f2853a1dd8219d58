//! Durable filename -> processing state mapping.
//!
//! The backing file is a single JSON object (`{"syllabus.pdf": 1}`) that is
//! rewritten in full after every mutation. Writes go to a sibling `.tmp`
//! file that is renamed over the original, so a crash mid-write leaves the
//! previous snapshot intact.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FileState {
    NotSummarized,
    Summarized,
}

impl From<FileState> for u8 {
    fn from(state: FileState) -> Self {
        match state {
            FileState::NotSummarized => 0,
            FileState::Summarized => 1,
        }
    }
}

impl TryFrom<u8> for FileState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NotSummarized),
            1 => Ok(Self::Summarized),
            other => Err(format!("invalid file state {}", other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("File not found in status ledger: {0}")]
    NotFound(String),

    #[error("Failed to write status ledger {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize status ledger: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerCounts {
    pub tracked: usize,
    pub summarized: usize,
    pub not_summarized: usize,
}

pub struct StatusLedger {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, FileState>>,
}

impl StatusLedger {
    /// Create an empty ledger backed by `path`. Call [`load`](Self::load) to
    /// pick up existing state.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Replace in-memory state with the persisted document. Unreadable or
    /// malformed documents fall back to an empty ledger.
    pub async fn load(&self) -> usize {
        let loaded = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, FileState>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Malformed status ledger, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable status ledger, starting empty");
                BTreeMap::new()
            }
        };

        let count = loaded.len();
        *self.entries.lock().await = loaded;
        info!(path = %self.path.display(), entries = count, "Loaded status ledger");
        count
    }

    pub async fn get(&self, filename: &str) -> FileState {
        self.entries
            .lock()
            .await
            .get(filename)
            .copied()
            .unwrap_or(FileState::NotSummarized)
    }

    /// Update one entry and rewrite the backing file. A failed rewrite is
    /// logged and the in-memory update is kept.
    pub async fn set(&self, filename: &str, state: FileState) {
        let mut entries = self.entries.lock().await;
        entries.insert(filename.to_string(), state);
        self.persist_logged(&entries).await;
    }

    /// Check-and-mark in one critical section: returns `false` if the file is
    /// already summarized, otherwise records it as not summarized and returns
    /// `true`. Only writes when the entry changes.
    pub async fn begin_processing(&self, filename: &str) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.get(filename) {
            Some(FileState::Summarized) => false,
            Some(FileState::NotSummarized) => true,
            None => {
                entries.insert(filename.to_string(), FileState::NotSummarized);
                self.persist_logged(&entries).await;
                true
            }
        }
    }

    pub async fn reset_one(&self, filename: &str) -> Result<(), LedgerError> {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(filename) {
            Some(state) => *state = FileState::NotSummarized,
            None => return Err(LedgerError::NotFound(filename.to_string())),
        }
        self.persist_logged(&entries).await;
        Ok(())
    }

    /// Returns how many entries were reset.
    pub async fn reset_all(&self) -> usize {
        let mut entries = self.entries.lock().await;
        for state in entries.values_mut() {
            *state = FileState::NotSummarized;
        }
        self.persist_logged(&entries).await;
        entries.len()
    }

    pub async fn snapshot(&self) -> BTreeMap<String, FileState> {
        self.entries.lock().await.clone()
    }

    pub async fn counts(&self) -> LedgerCounts {
        let entries = self.entries.lock().await;
        let summarized = entries
            .values()
            .filter(|s| **s == FileState::Summarized)
            .count();
        LedgerCounts {
            tracked: entries.len(),
            summarized,
            not_summarized: entries.len() - summarized,
        }
    }

    async fn persist_logged(&self, entries: &BTreeMap<String, FileState>) {
        if let Err(e) = self.persist(entries).await {
            error!(error = %e, "Status ledger write failed, keeping in-memory state");
        }
    }

    async fn persist(&self, entries: &BTreeMap<String, FileState>) -> Result<(), LedgerError> {
        let io_err = |source| LedgerError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let body = serde_json::to_vec_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &body).await.map_err(io_err)?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ledger_in(dir: &TempDir) -> StatusLedger {
        StatusLedger::new(dir.path().join("file_status.json"))
    }

    #[test]
    fn test_state_serializes_as_integer() {
        let mut map = BTreeMap::new();
        map.insert("a.pdf".to_string(), FileState::Summarized);
        map.insert("b.docx".to_string(), FileState::NotSummarized);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"a.pdf":1,"b.docx":0}"#);

        assert!(serde_json::from_str::<BTreeMap<String, FileState>>(r#"{"x":2}"#).is_err());
    }

    #[tokio::test]
    async fn test_unknown_file_is_not_summarized() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        assert_eq!(ledger.get("never-seen.pdf").await, FileState::NotSummarized);
    }

    #[tokio::test]
    async fn test_set_survives_reload() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        ledger.set("syllabus.pdf", FileState::Summarized).await;

        let reloaded = ledger_in(&dir);
        assert_eq!(reloaded.load().await, 1);
        assert_eq!(reloaded.get("syllabus.pdf").await, FileState::Summarized);

        let raw = std::fs::read_to_string(dir.path().join("file_status.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["syllabus.pdf"], 1);

        // The temporary file is renamed away
        assert!(!dir.path().join("file_status.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_document_loads_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("file_status.json"), "{not json").unwrap();

        let ledger = ledger_in(&dir);
        assert_eq!(ledger.load().await, 0);
        assert_eq!(ledger.counts().await, LedgerCounts::default());
    }

    #[tokio::test]
    async fn test_missing_document_loads_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        assert_eq!(ledger.load().await, 0);
    }

    #[tokio::test]
    async fn test_begin_processing_skips_summarized() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);

        assert!(ledger.begin_processing("a.pdf").await);
        assert_eq!(ledger.counts().await.tracked, 1);
        assert!(ledger.begin_processing("a.pdf").await);

        ledger.set("a.pdf", FileState::Summarized).await;
        assert!(!ledger.begin_processing("a.pdf").await);
        assert_eq!(ledger.get("a.pdf").await, FileState::Summarized);
    }

    #[tokio::test]
    async fn test_reset_one() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        ledger.set("syllabus.pdf", FileState::Summarized).await;

        ledger.reset_one("syllabus.pdf").await.unwrap();
        assert_eq!(ledger.get("syllabus.pdf").await, FileState::NotSummarized);

        let err = ledger.reset_one("missing.pdf").await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(name) if name == "missing.pdf"));
    }

    #[tokio::test]
    async fn test_reset_all() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        ledger.set("a.pdf", FileState::Summarized).await;
        ledger.set("b.docx", FileState::Summarized).await;
        ledger.set("c.pdf", FileState::NotSummarized).await;

        assert_eq!(ledger.reset_all().await, 3);
        let counts = ledger.counts().await;
        assert_eq!(counts.summarized, 0);
        assert_eq!(counts.not_summarized, 3);

        let reloaded = ledger_in(&dir);
        reloaded.load().await;
        assert_eq!(reloaded.get("a.pdf").await, FileState::NotSummarized);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory_state() {
        let dir = TempDir::new().unwrap();
        // Parent is a regular file, so the rewrite cannot succeed
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let ledger = StatusLedger::new(blocker.join("file_status.json"));

        ledger.set("a.pdf", FileState::Summarized).await;
        assert_eq!(ledger.get("a.pdf").await, FileState::Summarized);
    }
}
