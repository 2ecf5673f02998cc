//! Model parameters: leaf matrices allocated in the arena, in a fixed order.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use super::{ModelConfig, ModelError, MLP_RATIO};
use crate::autograd::{Arena, NodeId};

/// Row-major matrix of parameter node ids.
pub(crate) type Matrix = Vec<Vec<NodeId>>;

/// The six weight matrices of one transformer layer.
pub(crate) struct LayerWeights {
    pub(crate) wq: Matrix,
    pub(crate) wk: Matrix,
    pub(crate) wv: Matrix,
    pub(crate) wo: Matrix,
    pub(crate) fc1: Matrix,
    pub(crate) fc2: Matrix,
}

/// All trainable parameters, as leaf nodes in the arena.
///
/// Parameters must be allocated before the first episode mark: they live for
/// the whole training run, accumulate gradients during each backward pass,
/// and are updated in place by the optimizer.
pub struct StateDict {
    pub(crate) wte: Matrix,
    pub(crate) wpe: Matrix,
    pub(crate) lm_head: Matrix,
    pub(crate) layers: Vec<LayerWeights>,
}

impl StateDict {
    /// Allocates and initializes all parameters. Weights draw from
    /// Gaussian(0, `init_std`), except the attention output projection and
    /// the MLP contraction, which start at zero so each block initially
    /// passes its residual through unchanged.
    pub(crate) fn init(
        arena: &mut Arena,
        config: &ModelConfig,
        init_std: f64,
        rng: &mut StdRng,
    ) -> Result<Self, ModelError> {
        let normal = Normal::new(0.0, init_std)
            .map_err(|e| ModelError::Config(format!("invalid init_std {init_std}: {e}")))?;

        let mut gauss = |arena: &mut Arena, nout: usize, nin: usize| -> Matrix {
            (0..nout)
                .map(|_| (0..nin).map(|_| arena.leaf(normal.sample(rng))).collect())
                .collect()
        };
        let zeros = |arena: &mut Arena, nout: usize, nin: usize| -> Matrix {
            (0..nout)
                .map(|_| (0..nin).map(|_| arena.leaf(0.0)).collect())
                .collect()
        };

        let wte = gauss(arena, config.vocab_size, config.n_embed);
        let wpe = gauss(arena, config.block_size, config.n_embed);
        let lm_head = gauss(arena, config.vocab_size, config.n_embed);
        let mut layers = Vec::with_capacity(config.n_layer);
        for _ in 0..config.n_layer {
            layers.push(LayerWeights {
                wq: gauss(arena, config.n_embed, config.n_embed),
                wk: gauss(arena, config.n_embed, config.n_embed),
                wv: gauss(arena, config.n_embed, config.n_embed),
                wo: zeros(arena, config.n_embed, config.n_embed),
                fc1: gauss(arena, MLP_RATIO * config.n_embed, config.n_embed),
                fc2: zeros(arena, config.n_embed, MLP_RATIO * config.n_embed),
            });
        }

        Ok(StateDict {
            wte,
            wpe,
            lm_head,
            layers,
        })
    }

    /// Flat parameter list in the canonical persistence order: token
    /// embedding, position embedding, lm head, then per layer wq, wk, wv,
    /// wo, fc1, fc2 — each matrix row-major. The checkpoint format depends
    /// on this order.
    #[must_use]
    pub fn params(&self) -> Vec<NodeId> {
        fn extend(params: &mut Vec<NodeId>, m: &Matrix) {
            for row in m {
                params.extend_from_slice(row);
            }
        }

        let mut params = Vec::new();
        extend(&mut params, &self.wte);
        extend(&mut params, &self.wpe);
        extend(&mut params, &self.lm_head);
        for layer in &self.layers {
            extend(&mut params, &layer.wq);
            extend(&mut params, &layer.wk);
            extend(&mut params, &layer.wv);
            extend(&mut params, &layer.wo);
            extend(&mut params, &layer.fc1);
            extend(&mut params, &layer.fc2);
        }
        params
    }
}
