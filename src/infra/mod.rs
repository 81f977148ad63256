// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles the concerns that touch the file system or an
// external library, so the data and recovery layers don't:
//
//   tokenizer_store.rs — WordPiece tokenizer
//                        Wraps a HuggingFace tokenizer as a
//                        SubwordTokenizer, loads tokenizer.json
//                        or a BERT vocab.txt.
//
//   artifacts.rs       — Prepare artifacts
//                        Saves/loads the prepared corpus and
//                        the prepare config as JSON.
//
//   score_reader.rs    — Model scores
//                        Reads the score batches `decode`
//                        turns back into triples.
//
//   metrics.rs         — Split statistics
//                        Writes per-split sizes and batch
//                        counts to a CSV file.

/// WordPiece tokenizer loading and wrapping
pub mod tokenizer_store;

/// Prepared corpus and config persistence
pub mod artifacts;

/// Model score batches for decoding
pub mod score_reader;

/// Split statistics CSV logger
pub mod metrics;
