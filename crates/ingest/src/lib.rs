pub mod chunk;
pub mod chunker;
pub mod reader;

pub use chunk::Chunk;
pub use chunker::{Chunker, ChunkerConfig, DEFAULT_MAX_CHUNK_CHARS};
pub use reader::{DocumentKind, DocumentReader, ExtractError, TextExtractor, extract_file};

use std::path::Path;

/// Whether the watcher and upload path accept this file
pub fn is_supported(path: &Path) -> bool {
    DocumentKind::from_path(path).is_some()
}

/// Whitespace-separated word count of extracted text
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("/in/syllabus.pdf")));
        assert!(is_supported(Path::new("Report.DOCX")));
        assert!(!is_supported(Path::new("image.png")));
        assert!(!is_supported(Path::new("pdf")));
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  one two\nthree\tfour  "), 4);
        assert_eq!(word_count(""), 0);
    }
}
