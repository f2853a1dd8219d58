use ingest::{ExtractError, TextExtractor, extract_file, word_count};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use summarize::{ChunkingSummarizer, SummarizeError};
use thiserror::Error;
use tracing::{info, warn};

use crate::ledger::{FileState, StatusLedger};
use crate::metrics::{PipelineMetrics, TimedOperation};
use crate::writer::SummaryWriter;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error(transparent)]
    Summarization(#[from] SummarizeError),

    #[error("Failed to write summary artifact for {0}")]
    Persistence(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub summary: String,
    pub filename: String,
    pub word_count: usize,
    pub chunks_total: usize,
    pub chunks_summarized: usize,
}

/// Extraction, chunked summarization and persistence for a single document.
/// Shared by the folder watcher and the upload path.
pub struct DocumentProcessor {
    extractor: Arc<dyn TextExtractor>,
    summarizer: ChunkingSummarizer,
    writer: SummaryWriter,
    ledger: Arc<StatusLedger>,
    metrics: Arc<PipelineMetrics>,
}

impl DocumentProcessor {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        summarizer: ChunkingSummarizer,
        writer: SummaryWriter,
        ledger: Arc<StatusLedger>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            extractor,
            summarizer,
            writer,
            ledger,
            metrics,
        }
    }

    pub fn ledger(&self) -> &Arc<StatusLedger> {
        &self.ledger
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Extract and summarize without touching the ledger or output directory
    pub async fn summarize_document(
        &self,
        path: &Path,
        filename: &str,
    ) -> Result<DocumentSummary, ProcessError> {
        let text = extract_file(self.extractor.clone(), path).await?;
        info!(file = filename, chars = text.chars().count(), "Extracted text");

        let summary = self.summarizer.summarize(&text).await?;
        self.metrics
            .record_chunks(summary.chunks_summarized, summary.chunks_dropped());

        Ok(DocumentSummary {
            word_count: word_count(&text),
            filename: filename.to_string(),
            chunks_total: summary.chunks_total,
            chunks_summarized: summary.chunks_summarized,
            summary: summary.text,
        })
    }

    /// Summarize a watched file, write its artifact and only then mark it
    /// summarized. On any error the ledger entry stays not summarized so the
    /// next scan retries the whole file.
    pub async fn process_watched(&self, path: &Path, filename: &str) -> Result<PathBuf, ProcessError> {
        let timer = TimedOperation::start();
        let result = self.summarize_and_persist(path, filename).await;
        self.metrics.record_file(result.is_ok(), timer.elapsed());

        match &result {
            Ok(artifact) => info!(
                file = filename,
                artifact = %artifact.display(),
                elapsed_ms = timer.elapsed().as_millis() as u64,
                "File summarized"
            ),
            Err(e) => warn!(file = filename, error = %e, "File processing failed, will retry on next scan"),
        }

        result
    }

    async fn summarize_and_persist(&self, path: &Path, filename: &str) -> Result<PathBuf, ProcessError> {
        let document = self.summarize_document(path, filename).await?;

        let artifact = self
            .writer
            .write(&document.summary, filename)
            .await
            .ok_or_else(|| ProcessError::Persistence(filename.to_string()))?;

        self.ledger.set(filename, FileState::Summarized).await;
        Ok(artifact)
    }
}
