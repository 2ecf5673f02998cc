//! Errors raised while building or differentiating the computation graph.
//!
//! All errors produced by arena operations and the backward pass use
//! [`GraphError`]. They are raised synchronously at the point of violation
//! and propagate to the episode boundary; nothing is retried internally.

use std::fmt;

/// Errors produced by the scalar graph.
///
/// # Variants
///
/// - **Domain**: An operation was applied outside its mathematical domain
///   (log of a non-positive value, a negative base raised to a non-integer
///   power, division by a near-zero value).
///   *When*: At the operation factory, before the result node is created.
///   *Recovery*: None within the episode; the inputs indicate an upstream
///   modelling or data problem.
///
/// - **NonFinite**: A computed value or local derivative left the
///   representable `f64` range (overflow, or NaN from cancelled infinities).
///   *When*: At the operation factory, after computing the forward value.
///   *Recovery*: None within the episode; usually a sign of exploding
///   activations upstream.
///
/// - **TooLarge**: The defensive ceiling on graph size was hit before the
///   backward pass. This cannot happen for a correctly constructed graph and
///   indicates a structural bug (e.g. an unbounded loop building nodes).
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Operation applied outside its mathematical domain.
    Domain {
        /// The operation that rejected its input.
        op: &'static str,
        /// Human-readable description of the violated domain rule.
        message: String,
    },

    /// A computed value is NaN or infinite.
    NonFinite {
        /// The operation that produced the value.
        op: &'static str,
        /// The offending value.
        value: f64,
    },

    /// The graph exceeded the defensive node-count ceiling.
    TooLarge {
        /// Nodes currently in the arena.
        nodes: usize,
        /// The configured ceiling.
        limit: usize,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::Domain { op, message } => write!(f, "graph {op}: {message}"),
            GraphError::NonFinite { op, value } => {
                write!(f, "graph {op}: non-finite result {value}")
            }
            GraphError::TooLarge { nodes, limit } => {
                write!(f, "graph too large: {nodes} nodes exceeds limit {limit}")
            }
        }
    }
}

impl std::error::Error for GraphError {}
