//! Errors produced when loading the corpus.

use std::fmt;

/// Errors produced by the data loading module.
///
/// # Variants
///
/// - **Io**: Failed to read the file (not found, permission denied, invalid
///   UTF-8).
///   *When*: Opening or reading the path in [`PathLoader`](super::PathLoader)
///   or [`load_from_path`](super::load_from_path).
///   *Recovery*: Ensure the path exists, is readable, and contains valid
///   UTF-8; check the source for details.
///
/// - **EmptyCorpus**: The source was read successfully but yields no
///   documents (no lines, or every line blank after trimming — blank lines
///   are filtered, not errors).
///   *When*: After reading and filtering in
///   [`DataLoader::load`](super::DataLoader::load).
///   *Recovery*: Provide an input with at least one non-empty line.
#[derive(Debug)]
pub enum DataError {
    /// I/O error while reading the input file.
    Io(std::io::Error),

    /// The input yields no non-empty lines.
    EmptyCorpus,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io(e) => write!(f, "data io: {e}"),
            DataError::EmptyCorpus => write!(f, "data: input yields no documents"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io(e) => Some(e),
            DataError::EmptyCorpus => None,
        }
    }
}

impl From<std::io::Error> for DataError {
    fn from(e: std::io::Error) -> Self {
        DataError::Io(e)
    }
}
