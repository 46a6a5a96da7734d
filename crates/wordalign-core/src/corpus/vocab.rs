//! # Per-corpus Vocabulary
//!
//! Maps lower-cased tokens to dense indices in first-occurrence order.

use std::collections::HashMap;

/// Token to index mapping with contiguous indices starting at 0.
///
/// Each encoding call owns its own vocabulary; source and target corpora
/// never share one.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    indices: HashMap<String, u32>,
}

impl Vocabulary {
    /// Create an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the index of `token`, assigning the next free index if the
    /// token has not been seen yet.
    pub fn index_of_or_insert(&mut self, token: &str) -> u32 {
        if let Some(&index) = self.indices.get(token) {
            return index;
        }
        let index = self.indices.len() as u32;
        self.indices.insert(token.to_owned(), index);
        index
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
