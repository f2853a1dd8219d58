use anyhow::{Context, Result};
use dashmap::DashSet;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::processor::DocumentProcessor;

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub watch_dir: PathBuf,
    pub poll_interval: Duration,
    pub error_backoff: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            watch_dir: PathBuf::from("data/watched"),
            poll_interval: Duration::from_secs(2),
            error_backoff: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub candidates: usize,
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Filenames currently being processed
pub type InFlightSet = Arc<DashSet<String>>;

/// Holds a filename in the in-flight set until dropped
struct InFlightGuard {
    set: InFlightSet,
    filename: String,
}

impl InFlightGuard {
    fn acquire(set: &InFlightSet, filename: &str) -> Option<Self> {
        set.insert(filename.to_string()).then(|| Self {
            set: set.clone(),
            filename: filename.to_string(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.remove(&self.filename);
    }
}

/// Polls a directory and drives new or reset documents through the
/// [`DocumentProcessor`].
pub struct FolderWatcher {
    config: WatcherConfig,
    processor: Arc<DocumentProcessor>,
    in_flight: InFlightSet,
}

impl FolderWatcher {
    pub fn new(config: WatcherConfig, processor: Arc<DocumentProcessor>, in_flight: InFlightSet) -> Self {
        Self {
            config,
            processor,
            in_flight,
        }
    }

    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(token).await })
    }

    /// Scan until cancelled. Cancellation is observed only while sleeping
    /// between scans; a file being processed always runs to completion.
    pub async fn run(&self, token: CancellationToken) {
        info!(
            dir = %self.config.watch_dir.display(),
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Folder watcher started"
        );

        loop {
            let delay = match self.scan_once().await {
                Ok(report) => {
                    self.processor.metrics().record_scan(true);
                    if report.processed + report.failed > 0 {
                        info!(
                            candidates = report.candidates,
                            processed = report.processed,
                            failed = report.failed,
                            "Scan complete"
                        );
                    } else {
                        debug!(candidates = report.candidates, skipped = report.skipped, "Scan complete");
                    }
                    self.config.poll_interval
                }
                Err(e) => {
                    self.processor.metrics().record_scan(false);
                    error!(
                        error = %format!("{:#}", e),
                        backoff_ms = self.config.error_backoff.as_millis() as u64,
                        "Scan failed, backing off"
                    );
                    self.config.error_backoff
                }
            };

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(dir = %self.config.watch_dir.display(), "Folder watcher stopped");
    }

    /// One pass over the watched directory, processing candidates in
    /// filename order.
    pub async fn scan_once(&self) -> Result<ScanReport> {
        let candidates = discover(&self.config.watch_dir)
            .await
            .with_context(|| format!("Failed to scan {}", self.config.watch_dir.display()))?;

        let mut report = ScanReport {
            candidates: candidates.len(),
            ..ScanReport::default()
        };

        for path in candidates {
            let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                report.skipped += 1;
                continue;
            };

            let Some(_guard) = InFlightGuard::acquire(&self.in_flight, &filename) else {
                report.skipped += 1;
                continue;
            };

            if !self.processor.ledger().begin_processing(&filename).await {
                report.skipped += 1;
                continue;
            }

            info!(file = %filename, "Processing new file");
            match self.processor.process_watched(&path, &filename).await {
                Ok(_) => report.processed += 1,
                Err(_) => report.failed += 1,
            }
        }

        Ok(report)
    }
}

/// Regular files with a supported extension, sorted by name
pub async fn discover(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && ingest::is_supported(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
