//! Generate samples from a saved checkpoint, without retraining.
//!
//! Reads the checkpoint named by `PICOGPT_CHECKPOINT_PATH` (default
//! `picogpt.ckpt`), rebuilds the tokenizer and model from it, and prints
//! `PICOGPT_SAMPLE_SIZE` generations.

use rand::rngs::StdRng;
use rand::SeedableRng;

use picogpt::autograd::Arena;
use picogpt::checkpoint;
use picogpt::config;
use picogpt::model::Gpt;
use picogpt::tokenizer::{CharTokenizer, Tokenizer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::from_env()?;
    cfg.validate()?;

    let ckpt = checkpoint::load(&cfg.checkpoint_path)?;
    let tokenizer = CharTokenizer::from_table(ckpt.chars);
    println!("vocab size: {}", ckpt.config.vocab_size);

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut arena = Arena::new();
    let model = Gpt::new(
        &mut arena,
        ckpt.config,
        cfg.init_std,
        cfg.rmsnorm_eps,
        &mut rng,
    )?;
    model.load_params(&mut arena, &ckpt.params)?;
    println!("num params: {}", ckpt.params.len());

    println!("\n--- samples ---");
    let episode = arena.mark();
    for sample_idx in 0..cfg.sample_size {
        let tokens = model.generate(
            &mut arena,
            &mut rng,
            ckpt.bos,
            cfg.temperature,
            ckpt.config.block_size,
        )?;
        arena.release(episode);
        println!("sample {:2}: {}", sample_idx + 1, tokenizer.decode(&tokens));
    }

    Ok(())
}
