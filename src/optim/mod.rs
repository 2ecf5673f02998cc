//! Adam optimizer with bias correction and a cosine learning-rate schedule.
//!
//! The optimizer never builds graph nodes: it reads each parameter's
//! accumulated gradient from the arena, updates the parameter value in
//! place, and resets the gradient to zero. Callers must run it only after a
//! backward pass that completed without a fault — gradients from an aborted
//! pass are suspect and should be discarded with the episode.

use std::f64::consts::PI;

use crate::autograd::{Arena, NodeId};

/// Adam state: hyperparameters plus per-parameter first/second moment
/// buffers and a monotonically increasing step counter.
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    step_count: usize,
    m: Vec<f64>,
    v: Vec<f64>,
}

impl Adam {
    /// Creates an optimizer with the given hyperparameters. Call
    /// [`init`](Adam::init) before the first step.
    #[must_use]
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, eps: f64) -> Self {
        Adam {
            learning_rate,
            beta1,
            beta2,
            eps,
            step_count: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    /// Allocates zeroed moment buffers for `num_params` parameters.
    pub fn init(&mut self, num_params: usize) {
        self.m = vec![0.0; num_params];
        self.v = vec![0.0; num_params];
    }

    /// One optimization step over all `params`.
    ///
    /// The learning rate follows a cosine decay over `num_steps` keyed on
    /// the internal step counter:
    /// `lr_t = lr * 0.5 * (1 + cos(pi * step_count / num_steps))`.
    /// Every parameter's gradient is reset to zero afterwards.
    pub fn step(&mut self, arena: &mut Arena, params: &[NodeId], num_steps: usize) {
        debug_assert_eq!(self.m.len(), params.len(), "call init with the param count");
        self.step_count += 1;
        let progress = self.step_count as f64 / num_steps as f64;
        let lr_t = self.learning_rate * 0.5 * (1.0 + (PI * progress).cos());

        for (i, &p) in params.iter().enumerate() {
            let grad = arena.grad(p);
            self.m[i] = self.beta1 * self.m[i] + (1.0 - self.beta1) * grad;
            self.v[i] = self.beta2 * self.v[i] + (1.0 - self.beta2) * grad * grad;

            let m_hat = self.m[i] / (1.0 - self.beta1.powi(self.step_count as i32));
            let v_hat = self.v[i] / (1.0 - self.beta2.powi(self.step_count as i32));

            let updated = arena.value(p) - lr_t * m_hat / (v_hat.sqrt() + self.eps);
            arena.set_value(p, updated);
            arena.zero_grad(p);
        }
    }

    /// Resets every parameter's gradient without updating values.
    pub fn zero_grad(&self, arena: &mut Arena, params: &[NodeId]) {
        for &p in params {
            arena.zero_grad(p);
        }
    }

    /// Steps taken so far.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.step_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::Arena;

    #[test]
    fn step_moves_parameter_against_the_gradient() {
        let mut arena = Arena::new();
        let p = arena.leaf(1.0);
        // loss = p^2 -> dloss/dp = 2 at p = 1
        let loss = arena.mul(p, p).unwrap();
        arena.backward(loss).unwrap();
        assert_eq!(arena.grad(p), 2.0);

        let mut opt = Adam::new(0.1, 0.9, 0.95, 1e-8);
        opt.init(1);
        opt.step(&mut arena, &[p], 100);
        assert!(arena.value(p) < 1.0, "positive gradient must decrease value");
        assert_eq!(arena.grad(p), 0.0);
        assert_eq!(opt.step_count(), 1);
    }

    #[test]
    fn step_increases_value_for_negative_gradient() {
        let mut arena = Arena::new();
        let p = arena.leaf(1.0);
        let neg = arena.neg(p).unwrap();
        arena.backward(neg).unwrap();
        assert_eq!(arena.grad(p), -1.0);

        let mut opt = Adam::new(0.1, 0.9, 0.95, 1e-8);
        opt.init(1);
        opt.step(&mut arena, &[p], 100);
        assert!(arena.value(p) > 1.0);
    }

    #[test]
    fn cosine_schedule_reaches_zero_at_the_final_step() {
        let mut arena = Arena::new();
        let p = arena.leaf(1.0);
        let mut opt = Adam::new(0.1, 0.9, 0.95, 1e-8);
        opt.init(1);
        // fast-forward to the last step: cos(pi) = -1 -> lr_t = 0
        for _ in 0..9 {
            opt.step(&mut arena, &[p], 10);
        }
        let loss = arena.mul(p, p).unwrap();
        arena.backward(loss).unwrap();
        let before = arena.value(p);
        opt.step(&mut arena, &[p], 10);
        assert!((arena.value(p) - before).abs() < 1e-12);
    }

    #[test]
    fn zero_grad_clears_without_updating() {
        let mut arena = Arena::new();
        let p = arena.leaf(2.0);
        let loss = arena.mul(p, p).unwrap();
        arena.backward(loss).unwrap();
        let opt = Adam::new(0.1, 0.9, 0.95, 1e-8);
        opt.zero_grad(&mut arena, &[p]);
        assert_eq!(arena.grad(p), 0.0);
        assert_eq!(arena.value(p), 2.0);
    }
}
