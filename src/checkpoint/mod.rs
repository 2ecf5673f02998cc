//! Binary weight-file save and load.
//!
//! Layout (little-endian, fixed field order):
//! 1. five `i32`: vocab_size, n_embed, n_head, n_layer, block_size;
//! 2. `i32` character-table length `U`, then `U` raw bytes (the sorted
//!    unique character set), then `i32` BOS id (always `U`; vocab_size is
//!    always `U + 1`);
//! 3. one `f64` per parameter, in the canonical state-dict order (token
//!    embedding, position embedding, lm head, then per layer wq, wk, wv,
//!    wo, fc1, fc2 — each row-major).
//!
//! Loading validates every field before any allocation is sized from it.

mod error;

pub use error::CheckpointError;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::autograd::{Arena, NodeId};
use crate::model::{ModelConfig, MLP_RATIO};
use crate::tokenizer::{CharTokenizer, Tokenizer};

/// Sane upper bound for any persisted dimension; larger values mean the file
/// is not a checkpoint.
const MAX_DIM: i64 = 65_536;

/// A checkpoint read back from disk, ready to rebuild the tokenizer and
/// model.
pub struct LoadedCheckpoint {
    /// Architecture shape (already validated).
    pub config: ModelConfig,
    /// Sorted unique character table.
    pub chars: Vec<char>,
    /// BOS token id (always one past the character table).
    pub bos: usize,
    /// Flat parameter values in canonical order, all finite.
    pub params: Vec<f64>,
}

/// Writes the configuration, tokenizer table, and parameter values.
///
/// # Errors
///
/// [`CheckpointError::NonAsciiSymbol`] for a vocabulary character outside
/// ASCII; [`CheckpointError::NonFiniteParam`] for a non-finite parameter;
/// [`CheckpointError::Io`] on write failure.
pub fn save(
    path: impl AsRef<Path>,
    config: &ModelConfig,
    tokenizer: &CharTokenizer,
    arena: &Arena,
    params: &[NodeId],
) -> Result<(), CheckpointError> {
    let mut w = BufWriter::new(File::create(path)?);

    write_dim(&mut w, "vocab_size", config.vocab_size)?;
    write_dim(&mut w, "n_embed", config.n_embed)?;
    write_dim(&mut w, "n_head", config.n_head)?;
    write_dim(&mut w, "n_layer", config.n_layer)?;
    write_dim(&mut w, "block_size", config.block_size)?;

    let chars = tokenizer.chars();
    write_dim(&mut w, "char table length", chars.len())?;
    for &ch in chars {
        if !ch.is_ascii() {
            return Err(CheckpointError::NonAsciiSymbol(ch));
        }
        w.write_all(&[ch as u8])?;
    }
    write_dim(&mut w, "bos id", tokenizer.bos_id())?;

    for (index, &p) in params.iter().enumerate() {
        let value = arena.value(p);
        if !value.is_finite() {
            return Err(CheckpointError::NonFiniteParam { index, value });
        }
        w.write_all(&value.to_le_bytes())?;
    }
    w.flush()?;
    Ok(())
}

/// Reads and validates a checkpoint.
///
/// # Errors
///
/// [`CheckpointError::InvalidField`] for an implausible header field;
/// [`CheckpointError::Inconsistent`] when fields disagree;
/// [`CheckpointError::NonFiniteParam`] for a NaN/infinite parameter;
/// [`CheckpointError::Io`] on read failure or truncation.
pub fn load(path: impl AsRef<Path>) -> Result<LoadedCheckpoint, CheckpointError> {
    let mut r = BufReader::new(File::open(path)?);

    let vocab_size = read_dim(&mut r, "vocab_size")?;
    let n_embed = read_dim(&mut r, "n_embed")?;
    let n_head = read_dim(&mut r, "n_head")?;
    let n_layer = read_dim(&mut r, "n_layer")?;
    let block_size = read_dim(&mut r, "block_size")?;
    if n_embed % n_head != 0 {
        return Err(CheckpointError::Inconsistent(format!(
            "n_embed ({n_embed}) not divisible by n_head ({n_head})"
        )));
    }

    let table_len = read_count(&mut r, "char table length")?;
    let mut bytes = vec![0u8; table_len];
    r.read_exact(&mut bytes)?;
    let chars: Vec<char> = bytes.iter().map(|&b| b as char).collect();
    if !chars.windows(2).all(|w| w[0] < w[1]) {
        return Err(CheckpointError::Inconsistent(
            "character table is not sorted and unique".to_string(),
        ));
    }
    let bos = read_count(&mut r, "bos id")?;
    if bos != chars.len() {
        return Err(CheckpointError::Inconsistent(format!(
            "bos id ({bos}) must equal the character count ({})",
            chars.len()
        )));
    }
    if vocab_size != chars.len() + 1 {
        return Err(CheckpointError::Inconsistent(format!(
            "vocab_size ({vocab_size}) must equal character count + 1 ({})",
            chars.len() + 1
        )));
    }

    let config = ModelConfig {
        vocab_size,
        n_embed,
        n_head,
        n_layer,
        block_size,
    };
    let expected = param_count(&config);
    let mut params = Vec::with_capacity(expected);
    for index in 0..expected {
        let mut buf = [0u8; 8];
        r.read_exact(&mut buf)?;
        let value = f64::from_le_bytes(buf);
        if !value.is_finite() {
            return Err(CheckpointError::NonFiniteParam { index, value });
        }
        params.push(value);
    }

    Ok(LoadedCheckpoint {
        config,
        chars,
        bos,
        params,
    })
}

/// Number of parameters implied by the architecture shape.
#[must_use]
pub fn param_count(config: &ModelConfig) -> usize {
    let attn = 4 * config.n_embed * config.n_embed;
    let mlp = 2 * MLP_RATIO * config.n_embed * config.n_embed;
    2 * config.vocab_size * config.n_embed
        + config.block_size * config.n_embed
        + config.n_layer * (attn + mlp)
}

fn write_dim(w: &mut impl Write, field: &'static str, value: usize) -> Result<(), CheckpointError> {
    let v = i32::try_from(value).map_err(|_| CheckpointError::InvalidField {
        field,
        value: value as i64,
    })?;
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn read_i32(r: &mut impl Read) -> Result<i32, CheckpointError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Reads a strictly positive, bounded dimension.
fn read_dim(r: &mut impl Read, field: &'static str) -> Result<usize, CheckpointError> {
    let v = i64::from(read_i32(r)?);
    if v < 1 || v > MAX_DIM {
        return Err(CheckpointError::InvalidField { field, value: v });
    }
    Ok(v as usize)
}

/// Reads a non-negative, bounded count (the character table may be empty).
fn read_count(r: &mut impl Read, field: &'static str) -> Result<usize, CheckpointError> {
    let v = i64::from(read_i32(r)?);
    if v < 0 || v > MAX_DIM {
        return Err(CheckpointError::InvalidField { field, value: v });
    }
    Ok(v as usize)
}
