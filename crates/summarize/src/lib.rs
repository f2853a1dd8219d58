pub mod llm;
pub mod prompt;

pub use llm::{OllamaConfig, OllamaSummarizer};

use async_trait::async_trait;
use ingest::{Chunker, ChunkerConfig};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Joins per-chunk summaries in the final text
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Remote summarization backend
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize(&self, text: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("No text to summarize")]
    EmptyText,

    #[error("All {chunks} chunks failed to summarize")]
    AllChunksFailed { chunks: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkedSummary {
    pub text: String,
    pub chunks_total: usize,
    pub chunks_summarized: usize,
}

impl ChunkedSummary {
    pub fn chunks_dropped(&self) -> usize {
        self.chunks_total - self.chunks_summarized
    }
}

/// Summarizes arbitrarily long text by summarizing fixed-size chunks in
/// order and joining the results.
///
/// A chunk whose summary errors or comes back blank is dropped; the pass only
/// fails when nothing survives.
#[derive(Clone)]
pub struct ChunkingSummarizer {
    backend: Arc<dyn Summarize>,
    chunker: Chunker,
}

impl ChunkingSummarizer {
    pub fn new(backend: Arc<dyn Summarize>, config: ChunkerConfig) -> Self {
        Self {
            backend,
            chunker: Chunker::new(config),
        }
    }

    pub async fn summarize(&self, text: &str) -> Result<ChunkedSummary, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyText);
        }

        let chunks = self.chunker.chunk_text(text);
        let total = chunks.len();
        info!(
            chunks = total,
            chars = text.chars().count(),
            max_chunk_chars = self.chunker.max_chunk_chars(),
            "Split text for summarization"
        );

        let mut summaries = Vec::with_capacity(total);
        for chunk in &chunks {
            debug!(
                chunk = chunk.index + 1,
                of = total,
                est_tokens = chunk.estimated_tokens(),
                "Summarizing chunk"
            );

            match self.backend.summarize(&chunk.text).await {
                Ok(summary) if !summary.trim().is_empty() => {
                    summaries.push(summary.trim().to_string());
                }
                Ok(_) => {
                    warn!(chunk = chunk.index + 1, of = total, "Empty summary, dropping chunk");
                }
                Err(e) => {
                    warn!(
                        chunk = chunk.index + 1,
                        of = total,
                        error = %e,
                        "Summarization failed, dropping chunk"
                    );
                }
            }
        }

        if summaries.is_empty() {
            return Err(SummarizeError::AllChunksFailed { chunks: total });
        }

        Ok(ChunkedSummary {
            chunks_summarized: summaries.len(),
            chunks_total: total,
            text: summaries.join(CHUNK_SEPARATOR),
        })
    }
}
