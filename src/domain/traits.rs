// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The aligner and the collator never see a concrete tokenizer;
// they program against `SubwordTokenizer`. Likewise the
// application layer loads corpora through `CorpusSource`.
//
// Implementations:
//   - BertWordPiece (infra::tokenizer_store) → SubwordTokenizer
//   - JsonCorpusLoader (data::loader)        → CorpusSource

use crate::domain::example::RawCorpus;
use crate::error::{Error, Result};

// ─── SubwordTokenizer ─────────────────────────────────────────────────────────
/// A two-stage tokenizer over a fixed vocabulary.
///
/// Stage one splits a space-joined sentence into whole-word tokens
/// (normalising case, splitting punctuation). Stage two breaks one
/// whole-word token into subword units.
pub trait SubwordTokenizer: Send + Sync {
    /// Whole-word splitter over a space-joined string.
    fn basic_tokenize(&self, text: &str) -> Result<Vec<String>>;

    /// Subword splitter for one whole-word token.
    fn subword_tokenize(&self, token: &str) -> Result<Vec<String>>;

    /// Vocabulary lookup.
    fn token_to_id(&self, token: &str) -> Option<u32>;

    /// Sequence-start boundary marker.
    fn cls_token(&self) -> &str;

    /// Sequence-end boundary marker.
    fn sep_token(&self) -> &str;

    /// Map every token to its id, failing on the first unknown one.
    fn convert_tokens_to_ids(&self, tokens: &[&str]) -> Result<Vec<u32>> {
        tokens
            .iter()
            .map(|t| {
                self.token_to_id(t)
                    .ok_or_else(|| Error::UnknownToken((*t).to_string()))
            })
            .collect()
    }
}

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Anything that can produce the word-level corpus plus the two label
/// vocabularies (intents, tags).
pub trait CorpusSource {
    fn load_corpus(&self) -> anyhow::Result<RawCorpus>;

    fn load_vocabularies(&self) -> anyhow::Result<(Vec<String>, Vec<String>)>;
}
