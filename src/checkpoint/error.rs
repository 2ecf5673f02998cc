//! Errors produced when saving or loading a weight checkpoint.

use std::fmt;

/// Errors produced by the checkpoint module.
///
/// # Variants
///
/// - **Io**: The file could not be created, read, or was shorter than the
///   declared layout.
///
/// - **InvalidField**: A numeric header field failed its plausibility check
///   (non-positive, or beyond the sane bound).
///   *When*: While reading the header.
///   *Recovery*: The file is not a valid checkpoint (or was written by an
///   incompatible version); re-train or locate the correct file.
///
/// - **Inconsistent**: Header fields that must agree do not (embedding width
///   vs. head count, BOS id vs. character table, vocab size vs. table
///   length, unsorted table).
///
/// - **NonFiniteParam**: A stored parameter is NaN or infinite.
///
/// - **NonAsciiSymbol**: The tokenizer table contains a character the
///   single-byte table encoding cannot represent.
///   *When*: At save time.
///   *Recovery*: Restrict the corpus to ASCII.
#[derive(Debug)]
pub enum CheckpointError {
    /// I/O failure, including truncated files.
    Io(std::io::Error),

    /// A header field is implausible.
    InvalidField {
        /// Which field.
        field: &'static str,
        /// The value read.
        value: i64,
    },

    /// Header fields disagree with each other.
    Inconsistent(String),

    /// A stored parameter is not finite.
    NonFiniteParam {
        /// Index into the flat parameter list.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// A vocabulary character does not fit the single-byte table encoding.
    NonAsciiSymbol(char),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Io(e) => write!(f, "checkpoint io: {e}"),
            CheckpointError::InvalidField { field, value } => {
                write!(f, "checkpoint: invalid {field} ({value})")
            }
            CheckpointError::Inconsistent(m) => write!(f, "checkpoint: {m}"),
            CheckpointError::NonFiniteParam { index, value } => {
                write!(f, "checkpoint: parameter {index} is not finite ({value})")
            }
            CheckpointError::NonAsciiSymbol(ch) => {
                write!(f, "checkpoint: non-ASCII vocabulary character {ch:?}")
            }
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckpointError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CheckpointError {
    fn from(e: std::io::Error) -> Self {
        CheckpointError::Io(e)
    }
}
