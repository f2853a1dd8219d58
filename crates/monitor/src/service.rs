use anyhow::{Context, Result};
use dashmap::DashSet;
use ingest::{ChunkerConfig, TextExtractor};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use summarize::{ChunkingSummarizer, Summarize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ledger::{FileState, LedgerError, StatusLedger};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::processor::{DocumentProcessor, DocumentSummary, ProcessError};
use crate::watcher::{FolderWatcher, InFlightSet, WatcherConfig};
use crate::writer::SummaryWriter;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub watcher: WatcherConfig,
    pub output_dir: PathBuf,
    pub status_file: PathBuf,
    pub max_chunk_chars: usize,
    pub stop_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            watcher: WatcherConfig::default(),
            output_dir: PathBuf::from("data/summaries"),
            status_file: PathBuf::from("data/file_status.json"),
            max_chunk_chars: ingest::DEFAULT_MAX_CHUNK_CHARS,
            stop_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    /// A stop is still waiting for the previous loop to exit
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
    /// The loop did not exit within the stop timeout and was aborted
    TimedOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitoringStatus {
    pub active: bool,
    pub stopping: bool,
    pub tracked_count: usize,
    pub summarized_count: usize,
    pub in_flight_count: usize,
    pub watched_directory: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileStatusReport {
    pub files: BTreeMap<String, FileState>,
    pub total: usize,
    pub summarized: usize,
    pub not_summarized: usize,
}

struct WatcherHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the status ledger and the folder watcher's lifecycle.
pub struct IngestionService {
    config: ServiceConfig,
    processor: Arc<DocumentProcessor>,
    ledger: Arc<StatusLedger>,
    in_flight: InFlightSet,
    watcher: Mutex<Option<WatcherHandle>>,
    stopping: AtomicBool,
}

impl IngestionService {
    pub fn new(
        config: ServiceConfig,
        extractor: Arc<dyn TextExtractor>,
        backend: Arc<dyn Summarize>,
    ) -> Self {
        let ledger = Arc::new(StatusLedger::new(config.status_file.clone()));
        let summarizer = ChunkingSummarizer::new(
            backend,
            ChunkerConfig {
                max_chunk_chars: config.max_chunk_chars,
            },
        );
        let processor = Arc::new(DocumentProcessor::new(
            extractor,
            summarizer,
            SummaryWriter::new(config.output_dir.clone()),
            ledger.clone(),
            Arc::new(PipelineMetrics::new()),
        ));

        Self {
            config,
            processor,
            ledger,
            in_flight: Arc::new(DashSet::new()),
            watcher: Mutex::new(None),
            stopping: AtomicBool::new(false),
        }
    }

    pub fn watch_dir(&self) -> &Path {
        &self.config.watcher.watch_dir
    }

    pub async fn load_ledger(&self) -> usize {
        self.ledger.load().await
    }

    /// Load the ledger and spawn the poll loop
    pub async fn start_monitoring(&self) -> Result<StartOutcome> {
        let mut slot = self.watcher.lock().await;
        if slot.as_ref().is_some_and(|h| !h.task.is_finished()) {
            return Ok(StartOutcome::AlreadyRunning);
        }
        if self.is_stopping() {
            return Ok(StartOutcome::Stopping);
        }

        tokio::fs::create_dir_all(self.watch_dir())
            .await
            .with_context(|| format!("Failed to create watched directory {}", self.watch_dir().display()))?;
        self.ledger.load().await;

        let token = CancellationToken::new();
        let watcher = FolderWatcher::new(
            self.config.watcher.clone(),
            self.processor.clone(),
            self.in_flight.clone(),
        );
        let task = watcher.spawn(token.clone());
        *slot = Some(WatcherHandle { token, task });

        info!(dir = %self.watch_dir().display(), "Monitoring started");
        Ok(StartOutcome::Started)
    }

    /// Cancel the poll loop and wait for it to exit, bounded by the stop
    /// timeout. The watcher slot is released before waiting so status
    /// queries stay responsive while the current file finishes.
    pub async fn stop_monitoring(&self) -> StopOutcome {
        let WatcherHandle { token, mut task } = {
            let mut slot = self.watcher.lock().await;
            let Some(handle) = slot.take() else {
                return StopOutcome::NotRunning;
            };
            if handle.task.is_finished() {
                return StopOutcome::NotRunning;
            }
            self.stopping.store(true, Ordering::SeqCst);
            handle
        };

        token.cancel();
        let outcome = match tokio::time::timeout(self.config.stop_timeout, &mut task).await {
            Ok(_) => {
                info!("Monitoring stopped");
                StopOutcome::Stopped
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.config.stop_timeout.as_secs(),
                    "Watcher did not stop in time, aborting"
                );
                task.abort();
                StopOutcome::TimedOut
            }
        };

        self.stopping.store(false, Ordering::SeqCst);
        outcome
    }

    pub async fn is_active(&self) -> bool {
        self.watcher
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.task.is_finished())
    }

    /// True between a stop request and the loop's exit
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> MonitoringStatus {
        let counts = self.ledger.counts().await;
        MonitoringStatus {
            active: self.is_active().await,
            stopping: self.is_stopping(),
            tracked_count: counts.tracked,
            summarized_count: counts.summarized,
            in_flight_count: self.in_flight.len(),
            watched_directory: self.watch_dir().display().to_string(),
        }
    }

    pub async fn list_file_statuses(&self) -> FileStatusReport {
        let files = self.ledger.snapshot().await;
        let summarized = files
            .values()
            .filter(|s| **s == FileState::Summarized)
            .count();

        FileStatusReport {
            total: files.len(),
            not_summarized: files.len() - summarized,
            summarized,
            files,
        }
    }

    /// Reset one file, or every tracked file when `filename` is `None`.
    /// Returns how many entries were reset.
    pub async fn reset_status(&self, filename: Option<&str>) -> Result<usize, LedgerError> {
        let reset = match filename {
            Some(name) => {
                self.ledger.reset_one(name).await?;
                1
            }
            None => self.ledger.reset_all().await,
        };
        info!(file = filename.unwrap_or("*"), reset, "Reset file status");
        Ok(reset)
    }

    /// Synchronous path: summarize an uploaded document without recording it
    /// in the ledger or writing an artifact
    pub async fn summarize_upload(&self, path: &Path, filename: &str) -> Result<DocumentSummary, ProcessError> {
        let summary = self.processor.summarize_document(path, filename).await?;
        self.processor.metrics().record_upload();
        Ok(summary)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.processor.metrics().snapshot()
    }
}
