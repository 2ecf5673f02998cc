//! Train a picogpt model on a line-per-document corpus, save a checkpoint,
//! and print a few samples.
//!
//! Configuration comes from `PICOGPT_*` environment variables (see the
//! `config` module); unset values fall back to defaults. Each training step
//! builds one document's computation graph inside an arena episode, runs
//! backward, applies the Adam update, and releases the episode — parameters
//! are only touched after a backward pass that completed without a fault.

use rand::prelude::*;
use rand::rngs::StdRng;

use picogpt::autograd::Arena;
use picogpt::checkpoint;
use picogpt::config;
use picogpt::data::load_from_path;
use picogpt::model::{Gpt, ModelConfig};
use picogpt::optim::Adam;
use picogpt::tokenizer::{CharTokenizer, Tokenizer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::from_env()?;
    cfg.validate()?;
    let mut rng = StdRng::seed_from_u64(cfg.seed);

    // dataset: one document per line, shuffled
    let data = load_from_path(&cfg.input_path)?;
    let mut docs: Vec<String> = data.lines().iter().map(|s| s.to_string()).collect();
    docs.shuffle(&mut rng);
    println!("num docs: {}", docs.len());

    let tokenizer = CharTokenizer::fit(&docs);
    println!("vocab size: {}", tokenizer.vocab_size());

    let model_cfg = ModelConfig {
        vocab_size: tokenizer.vocab_size(),
        n_embed: cfg.n_embed,
        n_head: cfg.n_head,
        n_layer: cfg.n_layer,
        block_size: cfg.block_size,
    };
    let mut arena = Arena::new();
    let model = Gpt::new(&mut arena, model_cfg, cfg.init_std, cfg.rmsnorm_eps, &mut rng)?;
    let params = model.params();
    println!("num params: {}", params.len());

    let mut optimizer = Adam::new(cfg.learning_rate, cfg.beta1, cfg.beta2, cfg.epsilon);
    optimizer.init(params.len());

    // parameters stay below this mark; each step's graph dies with release
    let episode = arena.mark();
    for step in 0..cfg.num_steps {
        let doc = &docs[step % docs.len()];
        let tokens = tokenizer.encode(doc);

        let loss = model.sequence_loss(&mut arena, &tokens)?;
        arena.backward(loss)?;
        let loss_value = arena.value(loss);
        optimizer.step(&mut arena, &params, cfg.num_steps);
        arena.release(episode);

        if (step + 1) % cfg.loss_log_every == 0 || step == 0 {
            println!(
                "step {:4} / {:4} | loss {:.4}",
                step + 1,
                cfg.num_steps,
                loss_value
            );
        }
    }

    checkpoint::save(&cfg.checkpoint_path, &model_cfg, &tokenizer, &arena, &params)?;
    println!("checkpoint saved to {}", cfg.checkpoint_path.display());

    println!("\n--- samples ---");
    for sample_idx in 0..cfg.sample_size {
        let tokens = model.generate(
            &mut arena,
            &mut rng,
            tokenizer.bos_id(),
            cfg.temperature,
            cfg.block_size,
        )?;
        arena.release(episode);
        println!("sample {:2}: {}", sample_idx + 1, tokenizer.decode(&tokens));
    }

    Ok(())
}
