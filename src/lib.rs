//! Data preparation for joint intent detection and slot filling.
//!
//! Word-level BIO tags are aligned to subword tokens, padded into
//! fixed-shape batches with masks, and model scores are decoded back
//! into `(intent, slot, value)` triples.

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;
pub mod recovery;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};
