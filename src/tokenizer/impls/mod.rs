//! Implementations of [`Tokenizer`](super::Tokenizer).
//!
//! One file per implementation: [`char_impl`] for character-level.

mod char_impl;

pub use char_impl::CharTokenizer;
