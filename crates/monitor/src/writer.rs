use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{error, info};

const HEADER_RULE_WIDTH: usize = 50;

/// Writes finished summaries as `summary_<basename>_<YYYYMMDD_HHMMSS>.txt`.
///
/// Names have second resolution; two summaries of the same file within one
/// second share a name and the later write wins.
#[derive(Debug, Clone)]
pub struct SummaryWriter {
    output_dir: PathBuf,
}

impl SummaryWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Returns the artifact path, or `None` if it could not be written.
    pub async fn write(&self, summary: &str, original_filename: &str) -> Option<PathBuf> {
        self.write_at(summary, original_filename, Local::now()).await
    }

    pub async fn write_at(
        &self,
        summary: &str,
        original_filename: &str,
        generated_at: DateTime<Local>,
    ) -> Option<PathBuf> {
        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            error!(dir = %self.output_dir.display(), error = %e, "Failed to create output directory");
            return None;
        }

        let path = self
            .output_dir
            .join(artifact_name(original_filename, &generated_at));
        let content = render_artifact(summary, original_filename, &generated_at);

        match tokio::fs::write(&path, content).await {
            Ok(()) => {
                info!(file = original_filename, artifact = %path.display(), "Wrote summary");
                Some(path)
            }
            Err(e) => {
                error!(file = original_filename, artifact = %path.display(), error = %e, "Failed to write summary");
                None
            }
        }
    }
}

pub fn artifact_name(original_filename: &str, generated_at: &DateTime<Local>) -> String {
    let base = Path::new(original_filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| original_filename.to_string());

    format!("summary_{}_{}.txt", base, generated_at.format("%Y%m%d_%H%M%S"))
}

fn render_artifact(summary: &str, original_filename: &str, generated_at: &DateTime<Local>) -> String {
    format!(
        "Summary of: {}\nGenerated: {}\n{}\n\n{}\n",
        original_filename,
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(HEADER_RULE_WIDTH),
        summary
    )
}
