//! [`DataLoader`](super::super::DataLoader) implementation that reads from a
//! file path (UTF-8, one document per non-blank line).

use std::fs;
use std::path::Path;

use super::super::{Data, DataError, DataItem, DataLoader};

/// Loads documents from a file path. Lines are trimmed; blank lines are
/// filtered out.
#[derive(Clone, Debug)]
pub struct PathLoader<P>(pub P);

impl<P> PathLoader<P>
where
    P: AsRef<Path>,
{
    /// Creates a loader for the given path.
    #[must_use]
    pub fn new(path: P) -> Self {
        PathLoader(path)
    }
}

impl<P> DataLoader for PathLoader<P>
where
    P: AsRef<Path>,
{
    fn load(&self) -> Result<Data, DataError> {
        let content = fs::read_to_string(self.0.as_ref())?;
        let items: Vec<DataItem> = content.lines().filter_map(DataItem::new).collect();
        Data::new(items)
    }
}

/// Convenience: load documents from a path using [`PathLoader`].
///
/// # Errors
///
/// - [`DataError::Io`] when the path cannot be read or is not valid UTF-8.
/// - [`DataError::EmptyCorpus`] when no non-empty lines remain.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Data, DataError> {
    PathLoader::new(path).load()
}
