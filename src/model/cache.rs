//! Per-layer key/value cache grown one position at a time.

use crate::autograd::NodeId;

/// Cached key and value vectors for every processed position, per layer.
///
/// Entries are append-only and read-only once pushed: attention at position
/// `t` reads positions `<= t`, which is what makes the attention causal —
/// the cache simply never contains the future. Node ids stored here belong
/// to one arena episode and die with it.
pub struct KvCache {
    keys: Vec<Vec<Vec<NodeId>>>,
    values: Vec<Vec<Vec<NodeId>>>,
}

impl KvCache {
    /// Creates an empty cache for `n_layer` layers.
    #[must_use]
    pub fn new(n_layer: usize) -> Self {
        KvCache {
            keys: vec![Vec::new(); n_layer],
            values: vec![Vec::new(); n_layer],
        }
    }

    /// Appends the current position's key and value vectors for `layer`.
    pub(crate) fn push(&mut self, layer: usize, k: Vec<NodeId>, v: Vec<NodeId>) {
        self.keys[layer].push(k);
        self.values[layer].push(v);
    }

    /// Key vectors for all cached positions of `layer`, oldest first.
    pub(crate) fn keys(&self, layer: usize) -> &[Vec<NodeId>] {
        &self.keys[layer]
    }

    /// Value vectors for all cached positions of `layer`, oldest first.
    pub(crate) fn values(&self, layer: usize) -> &[Vec<NodeId>] {
        &self.values[layer]
    }

    /// Number of positions cached for `layer`.
    #[must_use]
    pub fn positions(&self, layer: usize) -> usize {
        self.keys[layer].len()
    }
}
