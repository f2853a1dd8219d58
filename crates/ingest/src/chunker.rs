use crate::chunk::Chunk;

/// Default chunk size, sized for the context window of small local models
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 3000;

#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    pub max_chunk_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

/// Splits text into contiguous, non-overlapping slices of at most
/// `max_chunk_chars` characters.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        // A zero-width chunk would never make progress
        let max_chunk_chars = config.max_chunk_chars.max(1);
        Self {
            config: ChunkerConfig { max_chunk_chars },
        }
    }

    pub fn max_chunk_chars(&self) -> usize {
        self.config.max_chunk_chars
    }

    /// Every chunk except the last holds exactly `max_chunk_chars` characters.
    /// Empty input yields no chunks.
    pub fn chunk_text(&self, text: &str) -> Vec<Chunk> {
        let max = self.config.max_chunk_chars;
        let mut chunks = Vec::new();

        let mut byte_start = 0;
        let mut char_start = 0;
        let mut chars_in_chunk = 0;

        for (byte_idx, _) in text.char_indices() {
            if chars_in_chunk == max {
                chunks.push(Chunk::new(
                    chunks.len(),
                    text[byte_start..byte_idx].to_string(),
                    (char_start, char_start + chars_in_chunk),
                ));
                byte_start = byte_idx;
                char_start += chars_in_chunk;
                chars_in_chunk = 0;
            }
            chars_in_chunk += 1;
        }

        // Flush the tail
        if chars_in_chunk > 0 {
            chunks.push(Chunk::new(
                chunks.len(),
                text[byte_start..].to_string(),
                (char_start, char_start + chars_in_chunk),
            ));
        }

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(ChunkerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(max: usize) -> Chunker {
        Chunker::new(ChunkerConfig { max_chunk_chars: max })
    }

    #[test]
    fn test_seven_thousand_chars_into_three_chunks() {
        let text = "a".repeat(7000);
        let chunks = chunker(3000).chunk_text(&text);

        let lengths: Vec<usize> = chunks.iter().map(|c| c.char_len()).collect();
        assert_eq!(lengths, vec![3000, 3000, 1000]);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunker(3000).chunk_text("Course syllabus");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Course syllabus");
        assert_eq!(chunks[0].offset, (0, 15));
    }

    #[test]
    fn test_exact_multiple_has_full_last_chunk() {
        let text = "b".repeat(600);
        let chunks = chunker(200).chunk_text(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].char_len(), 200);
    }

    #[test]
    fn test_chunk_count_and_coverage() {
        let text: String = (0..1234).map(|i| char::from(b'a' + (i % 26) as u8)).collect();

        for max in [1, 7, 100, 1233, 1234, 5000] {
            let chunks = chunker(max).chunk_text(&text);
            assert_eq!(chunks.len(), text.len().div_ceil(max), "max = {}", max);

            // Chunks tile the input with no gaps or overlaps
            let mut expected_start = 0;
            for (i, chunk) in chunks.iter().enumerate() {
                assert_eq!(chunk.index, i);
                assert_eq!(chunk.offset.0, expected_start);
                expected_start = chunk.offset.1;
            }
            assert_eq!(expected_start, 1234);

            let rejoined: String = chunks.iter().map(|c| c.text.as_str()).collect();
            assert_eq!(rejoined, text);
        }
    }

    #[test]
    fn test_multibyte_text_splits_on_characters() {
        let text = "é".repeat(5);
        let chunks = chunker(2).chunk_text(&text);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["éé", "éé", "é"]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunker(10).chunk_text("").is_empty());
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        let chunks = chunker(0).chunk_text("abc");
        assert_eq!(chunks.len(), 3);
    }
}
