//! Errors produced by the neural building blocks.

use std::fmt;

use crate::autograd::GraphError;

/// Errors produced by [`rmsnorm`](super::rmsnorm), [`linear`](super::linear)
/// and [`softmax`](super::softmax).
///
/// # Variants
///
/// - **Shape**: A dimension mismatch between the input vector and the weights
///   (or an empty input where at least one element is required).
///   *When*: Checked up front, before any node is created.
///   *Recovery*: Fatal for the episode; indicates a construction bug, not a
///   data problem.
///
/// - **Domain**: An intermediate left its mathematical domain (e.g. the
///   mean square plus epsilon in rmsnorm was not strictly positive).
///
/// - **Numeric**: An implausible or non-finite intermediate (rmsnorm scale
///   beyond the plausibility bound, softmax denominator underflow). Signals
///   upstream blow-up rather than a coding error.
///
/// - **Graph**: A scalar operation failed; see [`GraphError`].
#[derive(Debug)]
pub enum NnError {
    /// Input/weight dimension mismatch.
    Shape {
        /// What was being checked.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// An intermediate value left its mathematical domain.
    Domain {
        /// What was being computed.
        what: &'static str,
        /// The offending value.
        value: f64,
    },

    /// An implausible or non-finite intermediate value.
    Numeric {
        /// What was being computed.
        what: &'static str,
        /// The offending value.
        value: f64,
    },

    /// Underlying scalar-graph failure.
    Graph(GraphError),
}

impl fmt::Display for NnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NnError::Shape {
                what,
                expected,
                got,
            } => write!(f, "nn {what}: expected length {expected}, got {got}"),
            NnError::Domain { what, value } => write!(f, "nn {what}: domain violation ({value})"),
            NnError::Numeric { what, value } => write!(f, "nn {what}: implausible value {value}"),
            NnError::Graph(e) => write!(f, "nn: {e}"),
        }
    }
}

impl std::error::Error for NnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NnError::Graph(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GraphError> for NnError {
    fn from(e: GraphError) -> Self {
        NnError::Graph(e)
    }
}
