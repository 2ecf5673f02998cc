//! Autograd: an arena-owned scalar computation graph with backpropagation.
//!
//! Every node is a single `f64` value plus the bookkeeping reverse-mode
//! differentiation needs: the node's inputs and the local partial derivative
//! with respect to each, recorded at forward time. Nodes live in an
//! [`Arena`] and reference each other through [`NodeId`] handles, so the
//! graph has no borrowed pointers that could outlive their owner. Building
//! a node through one of the arena's operation factories is the *only* way
//! to produce a derived node; [`Arena::backward`] then propagates gradients
//! from a loss node to all leaves in reverse topological order.
//!
//! One arena episode covers one training step or one generation run: take a
//! [`Mark`](Arena::mark) after allocating long-lived parameters, build the
//! step's graph, run backward, and [`release`](Arena::release) back to the
//! mark. Ids taken after the mark must not be used after release.

mod arena;
mod backward;
mod error;
#[cfg(test)]
mod tests;

pub use arena::{Arena, Mark, NodeId};
pub use error::GraphError;
