// ============================================================
// Layer 4 — Batch Collator
// ============================================================
// Pads aligned, id-encoded examples into fixed-shape arrays.
//
// For a chunk of B examples:
//
//   L = max(len(subword_tokens)) + 2          (two boundary markers)
//
//   token_ids  [B, L]   [CLS] t1 t2 ... tn [SEP] 0 0 ...
//   token_mask [B, L]     1   1  1 ...  1    1   0 0 ...
//   tag_ids    [B, L]     0  g1 g2 ... gn    0   0 0 ...
//   tag_mask   [B, L]     0   1  1 ...  1    0   0 0 ...
//   intents    [B, I]   multi-hot over intent ids
//
// Boundary positions are part of the token mask but never of
// the tag mask. Pad value is 0 everywhere.
//
// Encoding (id lookup + shape checks) happens for EVERY row
// before anything is written, so a bad example fails the whole
// batch instead of producing a half-filled one.
//
// Two ways to draw chunks from a split:
//   - sampled:    batch_size draws with replacement (training)
//   - exhaustive: consecutive chunks in stored order (eval)

use std::borrow::Borrow;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::vocab::LabelVocab;
use crate::domain::example::AlignedExample;
use crate::domain::traits::SubwordTokenizer;
use crate::error::{Error, Result};

// ─── EncodedRow ───────────────────────────────────────────────────────────────
/// One example with token ids resolved and boundary markers added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedRow {
    /// `[CLS] subwords... [SEP]` as vocabulary ids.
    pub token_ids:  Vec<u32>,
    /// One tag id per subword (no boundary entries).
    pub tag_ids:    Vec<usize>,
    pub intent_ids: Vec<usize>,
}

impl EncodedRow {
    pub fn seq_len(&self) -> usize {
        self.token_ids.len()
    }
}

// ─── PaddedBatch ──────────────────────────────────────────────────────────────
/// Row-major padded arrays for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedBatch {
    pub batch_size: usize,
    /// L: longest row in the batch including both boundary markers.
    pub seq_len:    usize,
    pub intent_dim: usize,
    /// Occupied length of each row (the row's own subwords + 2).
    pub seq_lens:   Vec<usize>,
    pub token_ids:  Vec<i64>,
    pub tag_ids:    Vec<i64>,
    pub intents:    Vec<i64>,
    pub token_mask: Vec<i64>,
    pub tag_mask:   Vec<i64>,
}

impl PaddedBatch {
    /// Pad already-encoded rows. Each row must carry one tag per
    /// non-boundary token and intent ids below `intent_dim`.
    pub fn from_rows<R: Borrow<EncodedRow>>(rows: &[R], intent_dim: usize) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            let row = row.borrow();
            if row.tag_ids.len() + 2 != row.token_ids.len() {
                return Err(Error::shape(format!(
                    "row {i}: {} tag ids for {} token ids",
                    row.tag_ids.len(),
                    row.token_ids.len()
                )));
            }
            if let Some(&bad) = row.intent_ids.iter().find(|&&t| t >= intent_dim) {
                return Err(Error::shape(format!(
                    "row {i}: intent id {bad} outside intent dimension {intent_dim}"
                )));
            }
        }

        let batch_size = rows.len();
        let seq_len    = rows
            .iter()
            .map(|r| r.borrow().seq_len())
            .max()
            .unwrap_or(2);

        let mut batch = Self {
            batch_size,
            seq_len,
            intent_dim,
            seq_lens:   Vec::with_capacity(batch_size),
            token_ids:  vec![0; batch_size * seq_len],
            tag_ids:    vec![0; batch_size * seq_len],
            intents:    vec![0; batch_size * intent_dim],
            token_mask: vec![0; batch_size * seq_len],
            tag_mask:   vec![0; batch_size * seq_len],
        };

        for (i, row) in rows.iter().enumerate() {
            let row     = row.borrow();
            let sen_len = row.seq_len();
            let base    = i * seq_len;
            batch.seq_lens.push(sen_len);

            for (j, &id) in row.token_ids.iter().enumerate() {
                batch.token_ids[base + j]  = id as i64;
                batch.token_mask[base + j] = 1;
            }
            // positions 1..sen_len-1 skip both boundary markers
            for (j, &tag) in row.tag_ids.iter().enumerate() {
                batch.tag_ids[base + 1 + j]  = tag as i64;
                batch.tag_mask[base + 1 + j] = 1;
            }
            for &intent in &row.intent_ids {
                batch.intents[i * intent_dim + intent] = 1;
            }
        }

        Ok(batch)
    }

    pub fn token_row(&self, i: usize) -> &[i64] {
        &self.token_ids[i * self.seq_len..(i + 1) * self.seq_len]
    }

    pub fn tag_row(&self, i: usize) -> &[i64] {
        &self.tag_ids[i * self.seq_len..(i + 1) * self.seq_len]
    }

    pub fn token_mask_row(&self, i: usize) -> &[i64] {
        &self.token_mask[i * self.seq_len..(i + 1) * self.seq_len]
    }

    pub fn tag_mask_row(&self, i: usize) -> &[i64] {
        &self.tag_mask[i * self.seq_len..(i + 1) * self.seq_len]
    }

    pub fn intent_row(&self, i: usize) -> &[i64] {
        &self.intents[i * self.intent_dim..(i + 1) * self.intent_dim]
    }
}

// ─── BatchCollator ────────────────────────────────────────────────────────────
pub struct BatchCollator<'a, T: SubwordTokenizer + ?Sized> {
    tokenizer:  &'a T,
    intent_dim: usize,
    tag_dim:    usize,
}

impl<'a, T: SubwordTokenizer + ?Sized> BatchCollator<'a, T> {
    pub fn new(tokenizer: &'a T, vocab: &LabelVocab) -> Self {
        Self {
            tokenizer,
            intent_dim: vocab.intent_dim(),
            tag_dim:    vocab.tag_dim(),
        }
    }

    /// Validate one example against the vocabulary dimensions and resolve
    /// its token ids.
    pub fn encode(&self, example: &AlignedExample) -> Result<EncodedRow> {
        if example.tag_ids.len() != example.subword_tokens.len() {
            return Err(Error::shape(format!(
                "{} tag ids for {} subword tokens",
                example.tag_ids.len(),
                example.subword_tokens.len()
            )));
        }
        if let Some(&bad) = example.tag_ids.iter().find(|&&t| t >= self.tag_dim) {
            return Err(Error::shape(format!(
                "tag id {bad} outside tag dimension {}",
                self.tag_dim
            )));
        }
        if let Some(&bad) = example.intent_ids.iter().find(|&&t| t >= self.intent_dim) {
            return Err(Error::shape(format!(
                "intent id {bad} outside intent dimension {}",
                self.intent_dim
            )));
        }

        let mut tokens = Vec::with_capacity(example.padded_len());
        tokens.push(self.tokenizer.cls_token());
        tokens.extend(example.subword_tokens.iter().map(String::as_str));
        tokens.push(self.tokenizer.sep_token());

        Ok(EncodedRow {
            token_ids:  self.tokenizer.convert_tokens_to_ids(&tokens)?,
            tag_ids:    example.tag_ids.clone(),
            intent_ids: example.intent_ids.iter().copied().collect(),
        })
    }

    /// Pad a chunk of examples, all or nothing.
    pub fn pad<E: Borrow<AlignedExample>>(&self, chunk: &[E]) -> Result<PaddedBatch> {
        if chunk.is_empty() {
            return Err(Error::invalid_config("cannot pad an empty batch"));
        }
        let rows = chunk
            .iter()
            .map(|e| self.encode(e.borrow()))
            .collect::<Result<Vec<_>>>()?;
        PaddedBatch::from_rows(&rows, self.intent_dim)
    }

    /// `batch_size` independent uniform draws with replacement.
    pub fn sampled_batch<R: Rng + ?Sized>(
        &self,
        split:      &[AlignedExample],
        batch_size: usize,
        rng:        &mut R,
    ) -> Result<PaddedBatch> {
        let chosen = sample_with_replacement(split, batch_size, rng)?;
        self.pad(&chosen)
    }

    /// Consecutive chunks in stored order, each with its true size.
    pub fn exhaustive_batches(
        &self,
        split:      &'a [AlignedExample],
        batch_size: usize,
    ) -> Result<ExhaustiveBatches<'a, T>> {
        Ok(ExhaustiveBatches {
            collator: *self,
            chunks:   exhaustive_chunks(split, batch_size)?,
        })
    }
}

impl<T: SubwordTokenizer + ?Sized> Clone for BatchCollator<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: SubwordTokenizer + ?Sized> Copy for BatchCollator<'_, T> {}

/// Lazily padded chunks of a split, paired with each chunk's true size.
pub struct ExhaustiveBatches<'a, T: SubwordTokenizer + ?Sized> {
    collator: BatchCollator<'a, T>,
    chunks:   std::slice::Chunks<'a, AlignedExample>,
}

impl<T: SubwordTokenizer + ?Sized> Iterator for ExhaustiveBatches<'_, T> {
    type Item = Result<(PaddedBatch, usize)>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        Some(self.collator.pad(chunk).map(|b| (b, chunk.len())))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

// ─── Chunk selection ──────────────────────────────────────────────────────────

/// Draw `batch_size` elements uniformly at random, duplicates allowed.
pub fn sample_with_replacement<'e, E, R: Rng + ?Sized>(
    split:      &'e [E],
    batch_size: usize,
    rng:        &mut R,
) -> Result<Vec<&'e E>> {
    if batch_size == 0 {
        return Err(Error::invalid_config("batch_size must be positive"));
    }
    (0..batch_size)
        .map(|_| {
            split
                .choose(rng)
                .ok_or_else(|| Error::invalid_config("cannot sample from an empty split"))
        })
        .collect()
}

/// `ceil(N / batch_size)` consecutive chunks covering every element once.
pub fn exhaustive_chunks<E>(split: &[E], batch_size: usize) -> Result<std::slice::Chunks<'_, E>> {
    if batch_size == 0 {
        return Err(Error::invalid_config("batch_size must be positive"));
    }
    Ok(split.chunks(batch_size))
}

/// Number of batches `exhaustive_chunks` yields.
pub fn batch_count(len: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        0
    } else {
        len.div_ceil(batch_size)
    }
}
