//! Neural building blocks expressed over scalar graph nodes.
//!
//! RMS normalization, linear projection, and softmax operate on slices of
//! [`NodeId`]s and compose the arena's differentiable operations, so
//! gradients flow through them without any dedicated backward code. These
//! are the numerically delicate pieces: rmsnorm guards its scale factor,
//! softmax shifts by the maximum logit before exponentiating.

mod error;

pub use error::NnError;

use crate::autograd::{Arena, NodeId};

/// Plausibility bound on the rmsnorm scale factor; values beyond this signal
/// upstream blow-up.
const MAX_RMSNORM_SCALE: f64 = 1e10;

/// RMS normalization: scales `x` by the inverse root-mean-square of its
/// entries (plus `eps`), so the output has unit RMS.
///
/// # Errors
///
/// - [`NnError::Shape`] for an empty input.
/// - [`NnError::Domain`] when mean-square + eps is not strictly positive.
/// - [`NnError::Numeric`] when the scale factor is non-finite or beyond the
///   plausibility bound.
pub fn rmsnorm(arena: &mut Arena, x: &[NodeId], eps: f64) -> Result<Vec<NodeId>, NnError> {
    if x.is_empty() {
        return Err(NnError::Shape {
            what: "rmsnorm input",
            expected: 1,
            got: 0,
        });
    }
    let mut ms = arena.leaf(0.0);
    for &xi in x {
        let sq = arena.mul(xi, xi)?;
        ms = arena.add(ms, sq)?;
    }
    ms = arena.div_const(ms, x.len() as f64)?;
    let ms_eps = arena.add_const(ms, eps)?;
    if arena.value(ms_eps) <= 0.0 {
        return Err(NnError::Domain {
            what: "rmsnorm mean square",
            value: arena.value(ms_eps),
        });
    }
    let scale = arena.pow(ms_eps, -0.5)?;
    let s = arena.value(scale);
    if !s.is_finite() || s.abs() > MAX_RMSNORM_SCALE {
        return Err(NnError::Numeric {
            what: "rmsnorm scale",
            value: s,
        });
    }
    x.iter()
        .map(|&xi| arena.mul(xi, scale).map_err(NnError::from))
        .collect()
}

/// Linear projection (matrix-vector multiply): one dot product of `x` per
/// row of `w`. The output length equals the number of rows.
///
/// # Errors
///
/// [`NnError::Shape`] when a weight row's length differs from `len(x)`.
pub fn linear(arena: &mut Arena, x: &[NodeId], w: &[Vec<NodeId>]) -> Result<Vec<NodeId>, NnError> {
    let mut out = Vec::with_capacity(w.len());
    for row in w {
        if row.len() != x.len() {
            return Err(NnError::Shape {
                what: "linear weight row",
                expected: x.len(),
                got: row.len(),
            });
        }
        let mut sum = arena.leaf(0.0);
        for (&wi, &xi) in row.iter().zip(x) {
            let prod = arena.mul(wi, xi)?;
            sum = arena.add(sum, prod)?;
        }
        out.push(sum);
    }
    Ok(out)
}

/// Softmax: logits to probabilities in [0, 1] summing to 1.
///
/// The maximum logit is subtracted as a *detached* constant snapshot before
/// exponentiating — gradient flows only through the shifted values, which is
/// exactly the standard stability trick (the shift cancels in the
/// derivative).
///
/// # Errors
///
/// - [`NnError::Shape`] for an empty input.
/// - [`NnError::Numeric`] when the exponential sum underflows below machine
///   epsilon (cannot happen for finite inputs: the max-shifted term is
///   exactly 1).
pub fn softmax(arena: &mut Arena, logits: &[NodeId]) -> Result<Vec<NodeId>, NnError> {
    if logits.is_empty() {
        return Err(NnError::Shape {
            what: "softmax input",
            expected: 1,
            got: 0,
        });
    }
    let max_val = logits
        .iter()
        .map(|&l| arena.value(l))
        .fold(f64::NEG_INFINITY, f64::max);
    let max_node = arena.leaf(max_val);

    let mut exps = Vec::with_capacity(logits.len());
    let mut total = arena.leaf(0.0);
    for &l in logits {
        let shifted = arena.sub(l, max_node)?;
        let e = arena.exp(shifted)?;
        total = arena.add(total, e)?;
        exps.push(e);
    }
    if arena.value(total) <= f64::EPSILON {
        return Err(NnError::Numeric {
            what: "softmax denominator",
            value: arena.value(total),
        });
    }
    exps.into_iter()
        .map(|e| arena.div(e, total).map_err(NnError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::Arena;

    fn leaves(arena: &mut Arena, values: &[f64]) -> Vec<NodeId> {
        values.iter().map(|&v| arena.leaf(v)).collect()
    }

    #[test]
    fn softmax_sums_to_one() {
        for input in [
            vec![1.0, 2.0, 3.0],
            vec![0.0],
            vec![-100.0, 0.0, 100.0],
            vec![5.0, 5.0, 5.0, 5.0],
        ] {
            let mut arena = Arena::new();
            let logits = leaves(&mut arena, &input);
            let probs = softmax(&mut arena, &logits).unwrap();
            let sum: f64 = probs.iter().map(|&p| arena.value(p)).sum();
            assert!((sum - 1.0).abs() < 1e-6, "sum {sum} for input {input:?}");
        }
    }

    #[test]
    fn softmax_singleton_is_one() {
        let mut arena = Arena::new();
        let logits = leaves(&mut arena, &[42.0]);
        let probs = softmax(&mut arena, &logits).unwrap();
        assert!((arena.value(probs[0]) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn softmax_rejects_empty_input() {
        let mut arena = Arena::new();
        assert!(matches!(
            softmax(&mut arena, &[]),
            Err(NnError::Shape { .. })
        ));
    }

    #[test]
    fn softmax_cross_entropy_gradients_match_closed_form() {
        // loss = -log(softmax(l)[1]) for l = [1, 2].
        // dloss/dl_i = p_i - 1[i == target]: p_0 ≈ 0.2689, p_1 - 1 ≈ -0.2689.
        let mut arena = Arena::new();
        let l1 = arena.leaf(1.0);
        let l2 = arena.leaf(2.0);
        let probs = softmax(&mut arena, &[l1, l2]).unwrap();
        let logp = arena.log(probs[1]).unwrap();
        let loss = arena.neg(logp).unwrap();
        arena.backward(loss).unwrap();

        let p0 = 1.0 / (1.0 + std::f64::consts::E);
        assert!((arena.grad(l1) - p0).abs() < 1e-4);
        assert!((arena.grad(l2) + p0).abs() < 1e-4);
        // increasing one logit's probability decreases the other's by as much
        assert!((arena.grad(l1) + arena.grad(l2)).abs() < 1e-10);
        assert!((arena.grad(l1) - 0.2689).abs() < 1e-3);
    }

    #[test]
    fn rmsnorm_uniform_vector_is_all_ones() {
        for k in [3.0, -2.5, 0.5, 1e6] {
            let mut arena = Arena::new();
            let x = leaves(&mut arena, &[k, k, k, k]);
            let normed = rmsnorm(&mut arena, &x, 1e-5).unwrap();
            for &n in &normed {
                assert!(
                    (arena.value(n).abs() - 1.0).abs() < 1e-4,
                    "entry {} for k={k}",
                    arena.value(n)
                );
                // sign is preserved
                assert_eq!(arena.value(n).signum(), k.signum());
            }
        }
    }

    #[test]
    fn rmsnorm_rejects_empty_input() {
        let mut arena = Arena::new();
        assert!(matches!(
            rmsnorm(&mut arena, &[], 1e-5),
            Err(NnError::Shape { .. })
        ));
    }

    #[test]
    fn rmsnorm_gradients_flow_to_input() {
        let mut arena = Arena::new();
        let x = leaves(&mut arena, &[1.0, 2.0]);
        let normed = rmsnorm(&mut arena, &x, 1e-5).unwrap();
        let sum = arena.add(normed[0], normed[1]).unwrap();
        arena.backward(sum).unwrap();
        // not asserting exact values; the chain must reach the leaves
        assert!(arena.grad(x[0]).abs() > 0.0);
        assert!(arena.grad(x[1]).abs() < 1.0); // larger entry is scaled down harder
    }

    #[test]
    fn linear_matches_manual_dot_products() {
        let mut arena = Arena::new();
        let x = leaves(&mut arena, &[1.0, 2.0]);
        let w = vec![
            leaves(&mut arena, &[1.0, 2.0]),
            leaves(&mut arena, &[3.0, 4.0]),
        ];
        let y = linear(&mut arena, &x, &w).unwrap();
        assert_eq!(y.len(), 2);
        assert!((arena.value(y[0]) - 5.0).abs() < 1e-10);
        assert!((arena.value(y[1]) - 11.0).abs() < 1e-10);
    }

    #[test]
    fn linear_gradient_of_weight_is_the_input() {
        let mut arena = Arena::new();
        let x = leaves(&mut arena, &[3.0, 7.0]);
        let w = vec![leaves(&mut arena, &[0.5, -0.5])];
        let y = linear(&mut arena, &x, &w).unwrap();
        arena.backward(y[0]).unwrap();
        assert!((arena.grad(w[0][0]) - 3.0).abs() < 1e-10);
        assert!((arena.grad(w[0][1]) - 7.0).abs() < 1e-10);
    }

    #[test]
    fn linear_rejects_row_length_mismatch() {
        let mut arena = Arena::new();
        let x = leaves(&mut arena, &[1.0, 2.0]);
        let w = vec![leaves(&mut arena, &[1.0, 2.0, 3.0])];
        assert!(matches!(
            linear(&mut arena, &x, &w),
            Err(NnError::Shape { .. })
        ));
    }
}
