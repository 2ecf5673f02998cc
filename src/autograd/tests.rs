//! Tests for the scalar graph: forward values, backward gradients,
//! accumulation under fan-out, episode release, and error conditions.

use super::{Arena, GraphError};

#[test]
fn add_backward() {
    let mut arena = Arena::new();
    let a = arena.leaf(2.0);
    let b = arena.leaf(3.0);
    let c = arena.add(a, b).unwrap();
    assert_eq!(arena.value(c), 5.0);
    arena.backward(c).unwrap();
    assert_eq!(arena.grad(a), 1.0);
    assert_eq!(arena.grad(b), 1.0);
    assert_eq!(arena.grad(c), 1.0);
}

#[test]
fn mul_backward() {
    let mut arena = Arena::new();
    let a = arena.leaf(2.0);
    let b = arena.leaf(3.0);
    let c = arena.mul(a, b).unwrap();
    assert_eq!(arena.value(c), 6.0);
    arena.backward(c).unwrap();
    assert_eq!(arena.grad(a), 3.0);
    assert_eq!(arena.grad(b), 2.0);
}

#[test]
fn pow_backward() {
    let mut arena = Arena::new();
    let a = arena.leaf(2.0);
    let b = arena.pow(a, 3.0).unwrap();
    assert!((arena.value(b) - 8.0).abs() < 1e-10);
    arena.backward(b).unwrap();
    // d/dx x^3 = 3x^2 = 12 at x=2
    assert!((arena.grad(a) - 12.0).abs() < 1e-10);
}

#[test]
fn log_backward() {
    let mut arena = Arena::new();
    let a = arena.leaf(std::f64::consts::E);
    let b = arena.log(a).unwrap();
    assert!((arena.value(b) - 1.0).abs() < 1e-10);
    arena.backward(b).unwrap();
    assert!((arena.grad(a) - 1.0 / std::f64::consts::E).abs() < 1e-10);
}

#[test]
fn exp_backward() {
    let mut arena = Arena::new();
    let a = arena.leaf(1.0);
    let b = arena.exp(a).unwrap();
    assert!((arena.value(b) - std::f64::consts::E).abs() < 1e-10);
    arena.backward(b).unwrap();
    assert!((arena.grad(a) - std::f64::consts::E).abs() < 1e-10);
}

#[test]
fn relu_backward_positive() {
    let mut arena = Arena::new();
    let a = arena.leaf(1.5);
    let b = arena.relu(a);
    assert_eq!(arena.value(b), 1.5);
    arena.backward(b).unwrap();
    assert_eq!(arena.grad(a), 1.0);
}

#[test]
fn relu_backward_negative() {
    let mut arena = Arena::new();
    let a = arena.leaf(-0.5);
    let b = arena.relu(a);
    assert_eq!(arena.value(b), 0.0);
    arena.backward(b).unwrap();
    assert_eq!(arena.grad(a), 0.0);
}

#[test]
fn neg_backward() {
    let mut arena = Arena::new();
    let a = arena.leaf(3.0);
    let b = arena.neg(a).unwrap();
    assert_eq!(arena.value(b), -3.0);
    arena.backward(b).unwrap();
    assert_eq!(arena.grad(a), -1.0);
}

#[test]
fn sub_backward() {
    let mut arena = Arena::new();
    let a = arena.leaf(5.0);
    let b = arena.leaf(2.0);
    let c = arena.sub(a, b).unwrap();
    assert_eq!(arena.value(c), 3.0);
    arena.backward(c).unwrap();
    assert_eq!(arena.grad(a), 1.0);
    assert_eq!(arena.grad(b), -1.0);
}

#[test]
fn div_backward() {
    let mut arena = Arena::new();
    let a = arena.leaf(6.0);
    let b = arena.leaf(2.0);
    let c = arena.div(a, b).unwrap();
    assert!((arena.value(c) - 3.0).abs() < 1e-10);
    arena.backward(c).unwrap();
    assert!((arena.grad(a) - 0.5).abs() < 1e-10);
    // d/db (a/b) = -a/b^2 = -6/4 = -1.5
    assert!((arena.grad(b) + 1.5).abs() < 1e-10);
}

#[test]
fn gradient_accumulates_under_fanout() {
    // c = a + a uses the same node twice: dc/da = 2.
    let mut arena = Arena::new();
    let a = arena.leaf(3.0);
    let c = arena.add(a, a).unwrap();
    assert_eq!(arena.value(c), 6.0);
    arena.backward(c).unwrap();
    assert_eq!(arena.grad(a), 2.0);
}

#[test]
fn compound_expression_gradients() {
    // c = a*b + b^2 = 6 + 9 = 15; dc/da = b = 3, dc/db = a + 2b = 8.
    let mut arena = Arena::new();
    let a = arena.leaf(2.0);
    let b = arena.leaf(3.0);
    let ab = arena.mul(a, b).unwrap();
    let b2 = arena.pow(b, 2.0).unwrap();
    let c = arena.add(ab, b2).unwrap();
    assert_eq!(arena.value(c), 15.0);
    arena.backward(c).unwrap();
    assert!((arena.grad(a) - 3.0).abs() < 1e-10);
    assert!((arena.grad(b) - 8.0).abs() < 1e-10);
}

#[test]
fn relu_chain_gradients() {
    // loss = relu(a*b + c); a=1, b=2, c=-1 => loss = 1
    let mut arena = Arena::new();
    let a = arena.leaf(1.0);
    let b = arena.leaf(2.0);
    let c = arena.leaf(-1.0);
    let ab = arena.mul(a, b).unwrap();
    let sum = arena.add(ab, c).unwrap();
    let loss = arena.relu(sum);
    assert_eq!(arena.value(loss), 1.0);
    arena.backward(loss).unwrap();
    assert!((arena.grad(a) - 2.0).abs() < 1e-10);
    assert!((arena.grad(b) - 1.0).abs() < 1e-10);
    assert!((arena.grad(c) - 1.0).abs() < 1e-10);
}

#[test]
fn zero_grad_resets_accumulator() {
    let mut arena = Arena::new();
    let a = arena.leaf(2.0);
    let k = arena.leaf(3.0);
    let b = arena.mul(a, k).unwrap();
    arena.backward(b).unwrap();
    assert_eq!(arena.grad(a), 3.0);
    arena.zero_grad(a);
    assert_eq!(arena.grad(a), 0.0);
}

#[test]
fn set_value_updates_in_place() {
    let mut arena = Arena::new();
    let p = arena.leaf(1.0);
    arena.set_value(p, 0.75);
    assert_eq!(arena.value(p), 0.75);
}

#[test]
fn release_drops_episode_nodes_and_keeps_parameters() {
    let mut arena = Arena::new();
    let p = arena.leaf(1.5);
    let episode = arena.mark();
    let q = arena.leaf(2.0);
    let r = arena.mul(p, q).unwrap();
    arena.backward(r).unwrap();
    assert_eq!(arena.grad(p), 2.0);
    assert_eq!(arena.len(), 3);
    arena.release(episode);
    assert_eq!(arena.len(), 1);
    // parameter node survives with its value and accumulated gradient
    assert_eq!(arena.value(p), 1.5);
    assert_eq!(arena.grad(p), 2.0);
}

#[test]
fn log_rejects_non_positive() {
    let mut arena = Arena::new();
    let a = arena.leaf(0.0);
    assert!(matches!(
        arena.log(a),
        Err(GraphError::Domain { op: "log", .. })
    ));
    let b = arena.leaf(-1.0);
    assert!(matches!(
        arena.log(b),
        Err(GraphError::Domain { op: "log", .. })
    ));
}

#[test]
fn div_rejects_near_zero_divisor() {
    let mut arena = Arena::new();
    let a = arena.leaf(1.0);
    let b = arena.leaf(0.0);
    assert!(matches!(
        arena.div(a, b),
        Err(GraphError::Domain { op: "div", .. })
    ));
    assert!(matches!(
        arena.div_const(a, 0.0),
        Err(GraphError::Domain { op: "div", .. })
    ));
}

#[test]
fn pow_rejects_invalid_domains() {
    let mut arena = Arena::new();
    let neg = arena.leaf(-2.0);
    assert!(matches!(
        arena.pow(neg, 0.5),
        Err(GraphError::Domain { op: "pow", .. })
    ));
    let zero = arena.leaf(0.0);
    assert!(matches!(
        arena.pow(zero, -1.0),
        Err(GraphError::Domain { op: "pow", .. })
    ));
    // integer exponent on a negative base is fine
    let cube = arena.pow(neg, 3.0).unwrap();
    assert!((arena.value(cube) + 8.0).abs() < 1e-10);
}

#[test]
fn exp_rejects_overflowing_argument() {
    let mut arena = Arena::new();
    let a = arena.leaf(800.0);
    assert!(matches!(
        arena.exp(a),
        Err(GraphError::NonFinite { op: "exp", .. })
    ));
}

#[test]
fn add_rejects_overflow_to_infinity() {
    let mut arena = Arena::new();
    let a = arena.leaf(f64::MAX);
    let b = arena.leaf(f64::MAX);
    assert!(matches!(
        arena.add(a, b),
        Err(GraphError::NonFinite { op: "add", .. })
    ));
}

#[test]
fn backward_through_shared_subexpression() {
    // d = (a*b) + (a*b) built as two references to one product node.
    let mut arena = Arena::new();
    let a = arena.leaf(2.0);
    let b = arena.leaf(5.0);
    let ab = arena.mul(a, b).unwrap();
    let d = arena.add(ab, ab).unwrap();
    assert_eq!(arena.value(d), 20.0);
    arena.backward(d).unwrap();
    assert_eq!(arena.grad(ab), 2.0);
    assert_eq!(arena.grad(a), 10.0);
    assert_eq!(arena.grad(b), 4.0);
}

#[test]
fn deep_chain_does_not_overflow_the_stack() {
    // 20k chained adds exercise the iterative traversal.
    let mut arena = Arena::new();
    let one = arena.leaf(1.0);
    let mut x = arena.leaf(0.0);
    for _ in 0..20_000 {
        x = arena.add(x, one).unwrap();
    }
    arena.backward(x).unwrap();
    assert_eq!(arena.grad(one), 20_000.0);
}
