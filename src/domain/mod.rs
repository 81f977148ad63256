// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain data types and the traits other layers implement.
//
// Rules for this layer:
//   - NO burn types
//   - NO tokenizers types
//   - NO file I/O
//
// Everything here describes what an example, a split or a
// prediction IS. How they are produced lives in `data`,
// `recovery` and `infra`.

/// Word-level and subword-aligned training examples, dataset splits
pub mod example;

/// Recovered (intent, slot, value) predictions
pub mod prediction;

/// Tokenizer and corpus-source abstractions
pub mod traits;
