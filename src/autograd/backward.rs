//! Reverse-mode pass: topological ordering and chain-rule accumulation.

use super::arena::{Arena, NodeId};
use super::error::GraphError;

/// Defensive ceiling on graph size for one backward pass. A correctly built
/// graph never comes close; hitting it means node construction ran away.
const MAX_GRAPH_NODES: usize = 1_000_000;

/// Visit states for the iterative depth-first topological sort.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    Visited,
    Emitted,
}

impl Arena {
    /// Runs backpropagation from `root` (normally the loss).
    ///
    /// Builds a topological order of all nodes reachable from `root`, seeds
    /// `root`'s gradient with 1.0, then walks the order in reverse,
    /// accumulating `child.grad += local_grad * node.grad` for every
    /// recorded input. Accumulation (not assignment) is what makes fan-out
    /// correct: a node consumed by several downstream operations receives
    /// one contribution per consumer.
    ///
    /// # Errors
    ///
    /// [`GraphError::TooLarge`] when the arena exceeds the defensive node
    /// ceiling.
    pub fn backward(&mut self, root: NodeId) -> Result<(), GraphError> {
        let order = self.topo_order(root)?;
        self.nodes[root.0].grad = 1.0;
        for &id in order.iter().rev() {
            let grad = self.nodes[id.0].grad;
            for k in 0..self.nodes[id.0].children.len() {
                let child = self.nodes[id.0].children[k];
                let local = self.nodes[id.0].local_grads[k];
                self.nodes[child.0].grad += local * grad;
            }
        }
        Ok(())
    }

    /// Depth-first post-order from `root`: every node appears after all of
    /// its inputs. Iterative, so graph depth is not bounded by the call
    /// stack.
    fn topo_order(&self, root: NodeId) -> Result<Vec<NodeId>, GraphError> {
        if self.nodes.len() > MAX_GRAPH_NODES {
            return Err(GraphError::TooLarge {
                nodes: self.nodes.len(),
                limit: MAX_GRAPH_NODES,
            });
        }
        let mut state = vec![Visit::Unvisited; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(&id) = stack.last() {
            match state[id.0] {
                Visit::Unvisited => {
                    state[id.0] = Visit::Visited;
                    for &child in &self.nodes[id.0].children {
                        if state[child.0] == Visit::Unvisited {
                            stack.push(child);
                        }
                    }
                }
                Visit::Visited => {
                    stack.pop();
                    state[id.0] = Visit::Emitted;
                    order.push(id);
                }
                // Duplicate stack entry from a shared subexpression.
                Visit::Emitted => {
                    stack.pop();
                }
            }
        }
        Ok(order)
    }
}
