//! Errors produced while building or running the transformer.

use std::fmt;

use crate::autograd::GraphError;
use crate::nn::NnError;

/// Errors produced by the model module.
///
/// # Variants
///
/// - **TokenOutOfRange** / **PositionOutOfRange**: An id fell outside the
///   configured vocabulary or block size.
///   *When*: At the top of the forward pass, or for targets in the loss.
///   *Recovery*: Fix the caller; ids come from the tokenizer or sampler and
///   must respect the model shape.
///
/// - **Config**: The architecture shape is invalid (zero dimension, or
///   embedding width not divisible by head count).
///   *When*: At model construction.
///   *Recovery*: Fix the configuration.
///
/// - **Shape**: Two vectors that must line up (residual partners, loaded
///   parameter list) have different lengths. Fatal: indicates a construction
///   bug, not a data problem.
///
/// - **EmptySequence**: A training sequence had fewer than two tokens, so no
///   (input, target) pair exists.
///
/// - **Sampling**: The categorical sampler rejected the probability weights.
///
/// - **Nn**: A neural primitive failed; see [`NnError`].
#[derive(Debug)]
pub enum ModelError {
    /// Token id outside the configured vocabulary.
    TokenOutOfRange {
        /// The offending id.
        token_id: usize,
        /// Exclusive upper bound.
        vocab_size: usize,
    },

    /// Position id outside the configured block size.
    PositionOutOfRange {
        /// The offending id.
        pos_id: usize,
        /// Exclusive upper bound.
        block_size: usize,
    },

    /// Invalid architecture shape.
    Config(String),

    /// Dimension mismatch between vectors that must line up.
    Shape {
        /// What was being checked.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Training sequence too short to form an (input, target) pair.
    EmptySequence,

    /// Categorical sampling failed.
    Sampling(String),

    /// Underlying neural-primitive failure.
    Nn(NnError),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::TokenOutOfRange {
                token_id,
                vocab_size,
            } => write!(f, "model: token id {token_id} out of range (vocab {vocab_size})"),
            ModelError::PositionOutOfRange { pos_id, block_size } => {
                write!(f, "model: position {pos_id} out of range (block size {block_size})")
            }
            ModelError::Config(m) => write!(f, "model config: {m}"),
            ModelError::Shape {
                what,
                expected,
                got,
            } => write!(f, "model {what}: expected length {expected}, got {got}"),
            ModelError::EmptySequence => {
                write!(f, "model: sequence has fewer than two tokens")
            }
            ModelError::Sampling(m) => write!(f, "model sampling: {m}"),
            ModelError::Nn(e) => write!(f, "model: {e}"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Nn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NnError> for ModelError {
    fn from(e: NnError) -> Self {
        ModelError::Nn(e)
    }
}

impl From<GraphError> for ModelError {
    fn from(e: GraphError) -> Self {
        ModelError::Nn(NnError::Graph(e))
    }
}
