//! Corpus loading: documents as trimmed, non-blank text lines.
//!
//! This module defines the **trait** ([`DataLoader`]), **models**
//! ([`DataItem`], [`Data`]), and **error** ([`DataError`]).
//! Implementations (e.g. [`PathLoader`] for file paths) live in the `impls`
//! submodule.

mod error;
mod impls;
mod types;

pub use error::DataError;
pub use impls::{load_from_path, PathLoader};
pub use types::{Data, DataItem};

/// Trait for loading the training corpus.
pub trait DataLoader {
    /// Loads documents. Returns [`Data`] or a [`DataError`].
    fn load(&self) -> Result<Data, DataError>;
}
