// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from a word-level JSON corpus
// all the way to padded tensor batches.
//
// The pipeline flows in this order:
//
//   data.json + vocab files
//       │
//       ▼
//   JsonCorpusLoader  → reads splits and label vocabularies
//       │
//       ▼
//   SubwordAligner    → word tags → subword tags + new2ori map
//       │
//       ▼
//   PreparedCorpus    → aligned splits + train class weights
//       │
//       ▼
//   BatchCollator     → pads chunks into [B, L] / [B, I] arrays
//       │
//       ▼
//   AlignedDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   NluBatcher        → stacks rows into Int tensor batches
//
// Each module is responsible for exactly one step.

/// Reads data.json, intent_vocab.json and tag_vocab.json
pub mod loader;

/// Bidirectional label ↔ id maps
pub mod vocab;

/// Word-level tags → subword-level tags
pub mod aligner;

/// Log-ratio intent weights from the training split
pub mod weights;

/// Padding, masks, sampled and exhaustive batching
pub mod collator;

/// Top-level prepared corpus
pub mod prepared;

/// Implements Burn's Dataset trait for encoded rows
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

pub use prepared::{PreparedCorpus, SplitStats};
pub use vocab::LabelVocab;
