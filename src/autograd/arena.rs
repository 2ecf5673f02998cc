//! The node arena and its differentiable operation factories.

use super::error::GraphError;

/// Handle to a node in an [`Arena`].
///
/// Ids are plain indices and stay valid for as long as the node they name is
/// retained by the arena (i.e. until a [`Mark`] taken before the node's
/// creation is [`release`](Arena::release)d).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(pub(crate) usize);

/// Watermark separating long-lived nodes (parameters) from one episode's
/// intermediates. Produced by [`Arena::mark`], consumed by
/// [`Arena::release`].
#[derive(Clone, Copy, Debug)]
pub struct Mark(usize);

/// One scalar node: forward value, gradient accumulator, and the recorded
/// inputs with their local derivatives (parallel vectors, equal length).
pub(crate) struct Node {
    pub(crate) value: f64,
    pub(crate) grad: f64,
    pub(crate) children: Vec<NodeId>,
    pub(crate) local_grads: Vec<f64>,
}

/// Append-only owner of every node in one computation graph.
///
/// All derived nodes are created through the operation factories below, which
/// compute the forward value eagerly, record the chain-rule bookkeeping, and
/// append the result — there is no way to obtain a node the arena does not
/// own. Only `grad` ever mutates after creation (during
/// [`backward`](Arena::backward) and via [`zero_grad`](Arena::zero_grad)).
pub struct Arena {
    pub(crate) nodes: Vec<Node>,
}

/// `exp` arguments above this would overflow the `f64` range.
const EXP_MAX_ARG: f64 = 700.0;

fn ensure_finite(op: &'static str, value: f64) -> Result<f64, GraphError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GraphError::NonFinite { op, value })
    }
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Arena { nodes: Vec::new() }
    }

    /// Number of nodes currently owned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no nodes have been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Creates a leaf node (no inputs): a constant or a trainable parameter.
    pub fn leaf(&mut self, value: f64) -> NodeId {
        debug_assert!(value.is_finite(), "leaf created with non-finite value");
        self.nodes.push(Node {
            value,
            grad: 0.0,
            children: Vec::new(),
            local_grads: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Takes a watermark at the current size. Nodes created afterwards are
    /// dropped by [`release`](Arena::release).
    #[must_use]
    pub fn mark(&self) -> Mark {
        Mark(self.nodes.len())
    }

    /// Drops every node created after `mark`. Ids handed out since then must
    /// not be dereferenced again; doing so panics on out-of-range access.
    pub fn release(&mut self, mark: Mark) {
        self.nodes.truncate(mark.0);
    }

    /// Forward value of a node.
    #[must_use]
    pub fn value(&self, id: NodeId) -> f64 {
        self.nodes[id.0].value
    }

    /// Gradient accumulated at a node (meaningful after
    /// [`backward`](Arena::backward)).
    #[must_use]
    pub fn grad(&self, id: NodeId) -> f64 {
        self.nodes[id.0].grad
    }

    /// Overwrites a node's value in place. Intended for optimizer updates of
    /// leaf parameters.
    pub fn set_value(&mut self, id: NodeId, value: f64) {
        self.nodes[id.0].value = value;
    }

    /// Resets a node's gradient accumulator to zero.
    pub fn zero_grad(&mut self, id: NodeId) {
        self.nodes[id.0].grad = 0.0;
    }

    fn push(&mut self, value: f64, children: Vec<NodeId>, local_grads: Vec<f64>) -> NodeId {
        debug_assert_eq!(children.len(), local_grads.len());
        debug_assert!(children.iter().all(|c| c.0 < self.nodes.len()));
        self.nodes.push(Node {
            value,
            grad: 0.0,
            children,
            local_grads,
        });
        NodeId(self.nodes.len() - 1)
    }

    /// `a + b`. Local derivatives are 1 and 1.
    pub fn add(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, GraphError> {
        let out = ensure_finite("add", self.value(a) + self.value(b))?;
        Ok(self.push(out, vec![a, b], vec![1.0, 1.0]))
    }

    /// `a + k` for a literal `k`.
    pub fn add_const(&mut self, a: NodeId, k: f64) -> Result<NodeId, GraphError> {
        let out = ensure_finite("add", self.value(a) + k)?;
        Ok(self.push(out, vec![a], vec![1.0]))
    }

    /// `a * b`. Local derivatives are `b` and `a`.
    pub fn mul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, GraphError> {
        let (x, y) = (self.value(a), self.value(b));
        let out = ensure_finite("mul", x * y)?;
        Ok(self.push(out, vec![a, b], vec![y, x]))
    }

    /// `a * k` for a literal `k`.
    pub fn mul_const(&mut self, a: NodeId, k: f64) -> Result<NodeId, GraphError> {
        let out = ensure_finite("mul", self.value(a) * k)?;
        Ok(self.push(out, vec![a], vec![k]))
    }

    /// `-a`.
    pub fn neg(&mut self, a: NodeId) -> Result<NodeId, GraphError> {
        self.mul_const(a, -1.0)
    }

    /// `a - b` (as `a + (-b)`).
    pub fn sub(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, GraphError> {
        let neg_b = self.neg(b)?;
        self.add(a, neg_b)
    }

    /// `a / b` (as `a * b^-1`).
    ///
    /// # Errors
    ///
    /// [`GraphError::Domain`] when `|b|` is below machine epsilon.
    pub fn div(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, GraphError> {
        if self.value(b).abs() < f64::EPSILON {
            return Err(GraphError::Domain {
                op: "div",
                message: format!("division by zero or near-zero value {}", self.value(b)),
            });
        }
        let inv = self.pow(b, -1.0)?;
        self.mul(a, inv)
    }

    /// `a / k` for a literal `k`.
    ///
    /// # Errors
    ///
    /// [`GraphError::Domain`] when `|k|` is below machine epsilon.
    pub fn div_const(&mut self, a: NodeId, k: f64) -> Result<NodeId, GraphError> {
        if k.abs() < f64::EPSILON {
            return Err(GraphError::Domain {
                op: "div",
                message: format!("division by zero or near-zero value {k}"),
            });
        }
        self.mul_const(a, 1.0 / k)
    }

    /// `a ^ exponent`. Local derivative is `exponent * a^(exponent - 1)`.
    ///
    /// # Errors
    ///
    /// [`GraphError::Domain`] for a negative base with a non-integer
    /// exponent, or a zero base with a negative exponent.
    pub fn pow(&mut self, a: NodeId, exponent: f64) -> Result<NodeId, GraphError> {
        let base = self.value(a);
        if base < 0.0 && exponent.fract() != 0.0 {
            return Err(GraphError::Domain {
                op: "pow",
                message: format!("negative base {base} with non-integer exponent {exponent}"),
            });
        }
        if base == 0.0 && exponent < 0.0 {
            return Err(GraphError::Domain {
                op: "pow",
                message: format!("zero base with negative exponent {exponent}"),
            });
        }
        let out = ensure_finite("pow", base.powf(exponent))?;
        let local = ensure_finite("pow", exponent * base.powf(exponent - 1.0))?;
        Ok(self.push(out, vec![a], vec![local]))
    }

    /// Natural logarithm. Local derivative is `1/a`.
    ///
    /// # Errors
    ///
    /// [`GraphError::Domain`] when `a` is not strictly positive.
    pub fn log(&mut self, a: NodeId) -> Result<NodeId, GraphError> {
        let x = self.value(a);
        if x <= 0.0 {
            return Err(GraphError::Domain {
                op: "log",
                message: format!("log of non-positive value {x}"),
            });
        }
        let out = ensure_finite("log", x.ln())?;
        Ok(self.push(out, vec![a], vec![1.0 / x]))
    }

    /// Exponential. Local derivative is `exp(a)` itself.
    ///
    /// # Errors
    ///
    /// [`GraphError::NonFinite`] when the argument would overflow the `f64`
    /// range.
    pub fn exp(&mut self, a: NodeId) -> Result<NodeId, GraphError> {
        let x = self.value(a);
        if x > EXP_MAX_ARG {
            return Err(GraphError::NonFinite {
                op: "exp",
                value: f64::INFINITY,
            });
        }
        let out = x.exp();
        Ok(self.push(out, vec![a], vec![out]))
    }

    /// ReLU: `max(0, a)`. Local derivative is 1 for positive `a`, else 0.
    /// Cannot fail: a finite input always yields a finite result.
    pub fn relu(&mut self, a: NodeId) -> NodeId {
        let x = self.value(a);
        let local = if x > 0.0 { 1.0 } else { 0.0 };
        self.push(x.max(0.0), vec![a], vec![local])
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
