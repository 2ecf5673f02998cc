//! Character-level tokenizer: sorted unique characters, BOS as the last id.

use std::collections::BTreeSet;

use super::super::Tokenizer;

/// Character-level tokenizer built from a corpus.
///
/// Character ids are `0..U` in sorted order; BOS takes the synthetic id `U`
/// (one past the real characters), so `vocab_size == U + 1`. The same layout
/// is persisted in checkpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharTokenizer {
    uchars: Vec<char>,
    bos: usize,
}

impl CharTokenizer {
    /// Builds the vocabulary from documents: the sorted set of unique
    /// characters, with BOS appended after them.
    #[must_use]
    pub fn fit<S: AsRef<str>>(docs: &[S]) -> Self {
        let set: BTreeSet<char> = docs.iter().flat_map(|d| d.as_ref().chars()).collect();
        let uchars: Vec<char> = set.into_iter().collect();
        let bos = uchars.len();
        CharTokenizer { uchars, bos }
    }

    /// Rebuilds a tokenizer from a persisted character table (already
    /// sorted and unique).
    #[must_use]
    pub fn from_table(uchars: Vec<char>) -> Self {
        let bos = uchars.len();
        CharTokenizer { uchars, bos }
    }

    /// The sorted character table, without BOS.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.uchars
    }
}

impl Tokenizer for CharTokenizer {
    fn encode(&self, s: &str) -> Vec<usize> {
        let mut ids = vec![self.bos];
        for ch in s.chars() {
            if let Ok(i) = self.uchars.binary_search(&ch) {
                ids.push(i);
            }
        }
        ids.push(self.bos);
        ids
    }

    fn decode(&self, ids: &[usize]) -> String {
        // bos >= uchars.len(), so the range check drops it too
        ids.iter()
            .filter_map(|&id| self.uchars.get(id))
            .collect()
    }

    fn vocab_size(&self) -> usize {
        self.uchars.len() + 1
    }

    fn bos_id(&self) -> usize {
        self.bos
    }
}
