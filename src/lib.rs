//! # picogpt
//!
//! A character-level GPT trained end to end on a scalar autograd engine.
//!
//! The computation graph is built from individual `f64` nodes owned by an
//! [`autograd::Arena`]; [`Arena::backward`](autograd::Arena::backward) walks
//! the graph in reverse topological order and applies the chain rule. The
//! transformer (RMSNorm, multi-head causal attention with a KV cache,
//! squared-ReLU MLP) in [`model`] is expressed entirely in those scalar ops
//! via the building blocks in [`nn`]. Training uses [`optim::Adam`] with a
//! cosine learning-rate schedule; trained weights round-trip through the
//! binary format in [`checkpoint`].

pub mod autograd;
pub mod checkpoint;
pub mod config;
pub mod data;
pub mod model;
pub mod nn;
pub mod optim;
pub mod tokenizer;
