//! Configuration for model shape, training, inference, and paths.
//!
//! Load from environment via [`from_env`] and validate with
//! [`Config::validate`]. Default values and env key names are centralized in
//! the `constants` submodule.

mod builder;
mod constants;
mod error;

use std::path::PathBuf;

use constants::{
    DEFAULT_BETA1, DEFAULT_BETA2, DEFAULT_BLOCK_SIZE, DEFAULT_CHECKPOINT_PATH, DEFAULT_EPSILON,
    DEFAULT_INIT_STD, DEFAULT_INPUT_PATH, DEFAULT_LEARNING_RATE, DEFAULT_LOSS_LOG_EVERY,
    DEFAULT_NUM_STEPS, DEFAULT_N_EMBED, DEFAULT_N_HEAD, DEFAULT_N_LAYER, DEFAULT_RMSNORM_EPS,
    DEFAULT_SAMPLE_SIZE, DEFAULT_SEED, DEFAULT_TEMPERATURE,
};

pub use builder::{env_key, env_parsed, env_string, from_env};
pub use error::ConfigError;

/// Central configuration for the picogpt pipeline.
///
/// Holds model dimensions, training and inference parameters, and paths.
/// Use [`from_env`] to build from environment variables and
/// [`Config::validate`] before use.
#[derive(Clone, Debug)]
pub struct Config {
    /// Seed for RNG (reproducibility).
    pub seed: u64,
    /// Path to input corpus (one document per line).
    pub input_path: PathBuf,
    /// Path to save/load the weight checkpoint.
    pub checkpoint_path: PathBuf,

    /// Embedding dimension (must be divisible by `n_head`).
    pub n_embed: usize,
    /// Number of attention heads.
    pub n_head: usize,
    /// Number of transformer layers.
    pub n_layer: usize,
    /// Maximum context length (tokens).
    pub block_size: usize,

    /// Weight init standard deviation.
    pub init_std: f64,
    /// RMSNorm epsilon.
    pub rmsnorm_eps: f64,

    /// Adam learning rate.
    pub learning_rate: f64,
    /// Adam beta1.
    pub beta1: f64,
    /// Adam beta2.
    pub beta2: f64,
    /// Adam epsilon.
    pub epsilon: f64,

    /// Number of training steps.
    pub num_steps: usize,
    /// Log loss every this many steps.
    pub loss_log_every: usize,

    /// Sampling temperature (0 < T <= 1).
    pub temperature: f64,
    /// Number of samples to generate after training.
    pub sample_size: usize,
}

impl Default for Config {
    /// Returns default configuration (suitable for tests and fallbacks).
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
            n_embed: DEFAULT_N_EMBED,
            n_head: DEFAULT_N_HEAD,
            n_layer: DEFAULT_N_LAYER,
            block_size: DEFAULT_BLOCK_SIZE,
            init_std: DEFAULT_INIT_STD,
            rmsnorm_eps: DEFAULT_RMSNORM_EPS,
            learning_rate: DEFAULT_LEARNING_RATE,
            beta1: DEFAULT_BETA1,
            beta2: DEFAULT_BETA2,
            epsilon: DEFAULT_EPSILON,
            num_steps: DEFAULT_NUM_STEPS,
            loss_log_every: DEFAULT_LOSS_LOG_EVERY,
            temperature: DEFAULT_TEMPERATURE,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl Config {
    /// Validates configuration. Returns `Ok(())` if valid, or a
    /// [`ConfigError`].
    ///
    /// Ensures: `n_embed` divisible by `n_head`, non-zero dimensions, and a
    /// sane temperature range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_head == 0 {
            return Err(ConfigError::Validation(
                "n_head must be greater than 0".to_string(),
            ));
        }
        if !self.n_embed.is_multiple_of(self.n_head) {
            return Err(ConfigError::Validation(format!(
                "n_embed ({}) must be divisible by n_head ({})",
                self.n_embed, self.n_head
            )));
        }
        if self.block_size == 0 {
            return Err(ConfigError::Validation(
                "block_size must be greater than 0".to_string(),
            ));
        }
        if self.n_layer == 0 {
            return Err(ConfigError::Validation(
                "n_layer must be greater than 0".to_string(),
            ));
        }
        if self.temperature <= 0.0 || self.temperature > 1.0 {
            return Err(ConfigError::Validation(
                "temperature must be in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    /// Head dimension (n_embed / n_head).
    #[must_use]
    pub fn head_dim(&self) -> usize {
        self.n_embed / self.n_head
    }
}
