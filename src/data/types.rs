//! Types for loaded data: [`DataItem`] (one non-empty document) and
//! [`Data`] (a non-empty list of them).

use std::fmt;

use super::DataError;

/// A single non-empty document (one trimmed line of the corpus).
///
/// Construction trims and rejects blank lines, so downstream code never sees
/// an empty document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DataItem(String);

impl DataItem {
    /// Creates an item from a line (trimmed). Returns `None` when the line
    /// is blank — loaders filter such lines out.
    #[must_use]
    pub fn new(line: &str) -> Option<Self> {
        let s = line.trim();
        if s.is_empty() {
            None
        } else {
            Some(DataItem(s.to_string()))
        }
    }

    /// Returns the inner string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Loaded corpus: a non-empty list of [`DataItem`]s.
#[derive(Clone, Debug)]
pub struct Data(Vec<DataItem>);

impl Data {
    /// Builds [`Data`] from a list of items.
    ///
    /// # Errors
    ///
    /// [`DataError::EmptyCorpus`] when `items` is empty.
    pub fn new(items: Vec<DataItem>) -> Result<Self, DataError> {
        if items.is_empty() {
            return Err(DataError::EmptyCorpus);
        }
        Ok(Data(items))
    }

    /// Returns the number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no documents (cannot happen for a
    /// successfully constructed [`Data`]).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the documents as a slice.
    #[must_use]
    pub fn items(&self) -> &[DataItem] {
        &self.0
    }

    /// Returns the documents as string slices.
    #[must_use]
    pub fn lines(&self) -> Vec<&str> {
        self.0.iter().map(DataItem::as_str).collect()
    }
}
