// ============================================================
// Layer 4 — NLU Batcher
// ============================================================
// Implements burn's Batcher trait on top of the collator so the
// padded arrays can be fed to a burn DataLoader as tensors.
//
//   Vec<EncodedRow>  ──PaddedBatch::from_rows──►  flat Vec<i64>
//                    ──from_ints + reshape────►   Tensor [B, L]
//
// The rows arrive already encoded (see AlignedDataset), so this step
// only pads and uploads.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::collator::{EncodedRow, PaddedBatch};
use crate::data::vocab::LabelVocab;

// ─── NluBatch ─────────────────────────────────────────────────────────────────
/// A padded batch as burn tensors. All tensors have batch_size as their
/// first dimension.
#[derive(Debug, Clone)]
pub struct NluBatch<B: Backend> {
    /// `[batch_size, seq_len]`, `[CLS] ... [SEP]` then 0 padding
    pub token_ids:  Tensor<B, 2, Int>,
    /// `[batch_size, seq_len]`
    pub tag_ids:    Tensor<B, 2, Int>,
    /// `[batch_size, intent_dim]`, multi-hot
    pub intents:    Tensor<B, 2, Int>,
    /// `[batch_size, seq_len]`, 1 = real token (boundaries included)
    pub token_mask: Tensor<B, 2, Int>,
    /// `[batch_size, seq_len]`, 1 = position carries a tag
    pub tag_mask:   Tensor<B, 2, Int>,
    /// `[batch_size]`, occupied length of each row
    pub seq_lens:   Tensor<B, 1, Int>,
}

impl<B: Backend> NluBatch<B> {
    /// Upload a padded batch to `device`.
    pub fn from_padded(padded: &PaddedBatch, device: &B::Device) -> Self {
        let rows   = padded.batch_size;
        let matrix = |flat: &[i64], cols: usize| {
            Tensor::<B, 1, Int>::from_ints(flat, device).reshape([rows, cols])
        };
        let seq_lens: Vec<i64> = padded.seq_lens.iter().map(|&l| l as i64).collect();

        Self {
            token_ids:  matrix(&padded.token_ids, padded.seq_len),
            tag_ids:    matrix(&padded.tag_ids, padded.seq_len),
            intents:    matrix(&padded.intents, padded.intent_dim),
            token_mask: matrix(&padded.token_mask, padded.seq_len),
            tag_mask:   matrix(&padded.tag_mask, padded.seq_len),
            seq_lens:   Tensor::<B, 1, Int>::from_ints(seq_lens.as_slice(), device),
        }
    }
}

// ─── NluBatcher ───────────────────────────────────────────────────────────────
/// Holds the target device and the intent dimension (width of the
/// multi-hot matrix), taken from the same vocabulary the rows were
/// encoded with.
#[derive(Clone, Debug)]
pub struct NluBatcher<B: Backend> {
    device:     B::Device,
    intent_dim: usize,
}

impl<B: Backend> NluBatcher<B> {
    pub fn new(device: B::Device, vocab: &LabelVocab) -> Self {
        Self { device, intent_dim: vocab.intent_dim() }
    }

    pub fn intent_dim(&self) -> usize {
        self.intent_dim
    }
}

impl<B: Backend> Batcher<EncodedRow, NluBatch<B>> for NluBatcher<B> {
    fn batch(&self, items: Vec<EncodedRow>) -> NluBatch<B> {
        // burn's Batcher cannot return an error; rows from AlignedDataset
        // were checked by BatchCollator::encode against the same vocabulary
        let padded = PaddedBatch::from_rows(&items, self.intent_dim)
            .unwrap_or_else(|e| panic!("rows do not match the label vocabulary: {e}"));
        NluBatch::from_padded(&padded, &self.device)
    }
}
