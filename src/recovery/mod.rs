// ============================================================
// Recovery Layer
// ============================================================
// Turns model output back into (intent, slot, value) triples.
//
//   intent scores [I]     ──► multi-label intents (score > 0.5)
//   tag scores [L, T]     ──► arg-max tag per subword
//        + tag mask           │
//        + new2ori            ▼ keep first subword of each word
//        + words          word-level BIO tags
//                             │ span policy
//                             ▼
//                         (intent, slot, "cheap chinese")

/// Decoder and per-batch model output
pub mod decoder;

/// BIO span grouping policies (lenient / strict)
pub mod policy;

pub use decoder::{ExampleScores, ModelOutput, RecoveryDecoder, ScoreBatch};
pub use policy::{LenientBio, SpanPolicy, StrictBio};
