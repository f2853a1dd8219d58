use dotext::MsDoc;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("No text could be extracted from {0}")]
    NoText(String),

    #[error("Failed to extract text from {path}: {reason}")]
    Failed { path: String, reason: String },
}

impl ExtractError {
    fn failed(path: &Path, reason: impl ToString) -> Self {
        Self::Failed {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Case-insensitive match on the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

/// Turns a document on disk into plain text.
///
/// Implementations are blocking; use [`extract_file`] from async code.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Extracts PDF text with `pdf-extract` and DOCX text with `dotext`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentReader;

impl DocumentReader {
    fn read_pdf(path: &Path) -> Result<String, ExtractError> {
        let bytes = std::fs::read(path).map_err(|e| ExtractError::failed(path, e))?;
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractError::failed(path, e))
    }

    fn read_docx(path: &Path) -> Result<String, ExtractError> {
        let mut file = dotext::Docx::open(path).map_err(|e| ExtractError::failed(path, e))?;

        let mut text = String::new();
        file.read_to_string(&mut text)
            .map_err(|e| ExtractError::failed(path, e))?;
        Ok(text)
    }
}

impl TextExtractor for DocumentReader {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        match DocumentKind::from_path(path) {
            Some(DocumentKind::Pdf) => Self::read_pdf(path),
            Some(DocumentKind::Docx) => Self::read_docx(path),
            None => Err(ExtractError::Unsupported(
                path.extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_default(),
            )),
        }
    }
}

/// Run an extractor off the async runtime and reject documents that yield
/// only whitespace.
pub async fn extract_file(
    extractor: Arc<dyn TextExtractor>,
    path: &Path,
) -> Result<String, ExtractError> {
    let owned: PathBuf = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || extractor.extract(&owned))
        .await
        .map_err(|e| ExtractError::failed(path, e))??;

    if text.trim().is_empty() {
        tracing::debug!(path = %path.display(), "Document has no extractable text");
        return Err(ExtractError::NoText(path.display().to_string()));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct PlainText;

    impl TextExtractor for PlainText {
        fn extract(&self, path: &Path) -> Result<String, ExtractError> {
            std::fs::read_to_string(path).map_err(|e| ExtractError::failed(path, e))
        }
    }

    #[test]
    fn test_document_kind_is_case_insensitive() {
        assert_eq!(DocumentKind::from_path(Path::new("a.PDF")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_path(Path::new("b.Docx")), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_path(Path::new("c.txt")), None);
        assert_eq!(DocumentKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = DocumentReader.extract(Path::new("notes.md")).unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported(ext) if ext == "md"));
    }

    #[test]
    fn test_missing_pdf_fails() {
        let err = DocumentReader.extract(Path::new("/nonexistent/x.pdf")).unwrap_err();
        assert!(matches!(err, ExtractError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_whitespace_only_text_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blank.pdf");
        std::fs::write(&path, "   \n\t  ").unwrap();

        let err = extract_file(Arc::new(PlainText), &path).await.unwrap_err();
        assert!(matches!(err, ExtractError::NoText(_)));
    }

    #[tokio::test]
    async fn test_extract_file_returns_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("syllabus.pdf");
        std::fs::write(&path, "Week 1: Introduction").unwrap();

        let text = extract_file(Arc::new(PlainText), &path).await.unwrap();
        assert_eq!(text, "Week 1: Introduction");
    }
}
