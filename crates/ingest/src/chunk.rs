use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub offset: (usize, usize), // [start, end) character positions
}

impl Chunk {
    pub fn new(index: usize, text: String, offset: (usize, usize)) -> Self {
        Self {
            index,
            text,
            offset,
        }
    }

    /// Length in characters, which is what chunk limits are measured in
    pub fn char_len(&self) -> usize {
        self.offset.1 - self.offset.0
    }

    /// Estimate token count (rough: 1.3 tokens per word)
    pub fn estimated_tokens(&self) -> usize {
        let word_count = self.text.split_whitespace().count();
        (word_count as f64 * 1.3) as usize
    }
}
