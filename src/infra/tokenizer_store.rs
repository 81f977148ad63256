// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads the WordPiece tokenizer the aligner and collator use.
//
// The HuggingFace `Tokenizer` pipeline is split into the two
// stages `SubwordTokenizer` expects:
//
//   basic stage    normalizer (BertNormalizer: clean, lowercase)
//                  + pre-tokenizer (BertPreTokenizer: whitespace
//                  and punctuation)  → whole-word tokens
//   subword stage  the WordPiece model on one token → "play" "##ing"
//
// Two on-disk forms are accepted:
//   tokenizer.json  HuggingFace format, read as is
//   vocab.txt       one WordPiece piece per line, id = line number;
//                   wrapped in a BERT-style tokenizer JSON by hand,
//                   the same format `Tokenizer::from_file()` reads

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tokenizers::{
    Model, NormalizedString, Normalizer, OffsetReferential, OffsetType, PreTokenizedString,
    PreTokenizer, Tokenizer,
};

use crate::domain::traits::SubwordTokenizer;
use crate::error::{self, Error};

pub const PAD_TOKEN:  &str = "[PAD]";
pub const UNK_TOKEN:  &str = "[UNK]";
pub const CLS_TOKEN:  &str = "[CLS]";
pub const SEP_TOKEN:  &str = "[SEP]";
pub const MASK_TOKEN: &str = "[MASK]";

const SPECIAL_TOKENS: [&str; 5] = [PAD_TOKEN, UNK_TOKEN, CLS_TOKEN, SEP_TOKEN, MASK_TOKEN];

// ─── BertWordPiece ────────────────────────────────────────────────────────────
/// `SubwordTokenizer` over a HuggingFace BERT-style WordPiece tokenizer.
pub struct BertWordPiece {
    tokenizer: Tokenizer,
    cls:       String,
    sep:       String,
}

impl BertWordPiece {
    /// Wrap a tokenizer whose vocabulary contains `[CLS]` and `[SEP]`.
    pub fn new(tokenizer: Tokenizer) -> error::Result<Self> {
        Self::with_special_tokens(tokenizer, CLS_TOKEN, SEP_TOKEN)
    }

    pub fn with_special_tokens(
        tokenizer: Tokenizer,
        cls:       &str,
        sep:       &str,
    ) -> error::Result<Self> {
        for marker in [cls, sep] {
            if tokenizer.token_to_id(marker).is_none() {
                return Err(Error::tokenizer(format!(
                    "boundary marker '{marker}' is not in the vocabulary"
                )));
            }
        }
        Ok(Self { tokenizer, cls: cls.to_string(), sep: sep.to_string() })
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    pub fn inner(&self) -> &Tokenizer {
        &self.tokenizer
    }
}

impl SubwordTokenizer for BertWordPiece {
    fn basic_tokenize(&self, text: &str) -> error::Result<Vec<String>> {
        let mut normalized = NormalizedString::from(text);
        if let Some(normalizer) = self.tokenizer.get_normalizer() {
            normalizer.normalize(&mut normalized).map_err(Error::tokenizer)?;
        }

        let mut pretokenized = PreTokenizedString::from(normalized);
        if let Some(pre_tokenizer) = self.tokenizer.get_pre_tokenizer() {
            pre_tokenizer
                .pre_tokenize(&mut pretokenized)
                .map_err(Error::tokenizer)?;
        }

        Ok(pretokenized
            .get_splits(OffsetReferential::Normalized, OffsetType::Char)
            .into_iter()
            .map(|(split, _, _)| split.trim())
            .filter(|split| !split.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn subword_tokenize(&self, token: &str) -> error::Result<Vec<String>> {
        let pieces = self
            .tokenizer
            .get_model()
            .tokenize(token)
            .map_err(Error::tokenizer)?;
        Ok(pieces.into_iter().map(|t| t.value).collect())
    }

    fn token_to_id(&self, token: &str) -> Option<u32> {
        self.tokenizer.token_to_id(token)
    }

    fn cls_token(&self) -> &str {
        &self.cls
    }

    fn sep_token(&self) -> &str {
        &self.sep
    }
}

// ─── TokenizerStore ───────────────────────────────────────────────────────────
/// Loads the tokenizer stored at one path.
pub struct TokenizerStore {
    path: PathBuf,
}

impl TokenizerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `.txt` is read as a WordPiece vocabulary, anything else as tokenizer JSON.
    pub fn load(&self) -> Result<BertWordPiece> {
        let is_vocab_txt = self.path.extension().is_some_and(|ext| ext == "txt");
        let tokenizer = if is_vocab_txt {
            let text = std::fs::read_to_string(&self.path)
                .with_context(|| format!("Cannot read vocabulary '{}'", self.path.display()))?;
            let pieces: Vec<&str> = text.lines().map(str::trim_end).collect();
            wordpiece_from_vocab(&pieces)
                .with_context(|| format!("Invalid vocabulary '{}'", self.path.display()))?
        } else {
            let tokenizer = Tokenizer::from_file(&self.path).map_err(|e| {
                anyhow::anyhow!("Cannot load tokenizer from '{}': {}", self.path.display(), e)
            })?;
            BertWordPiece::new(tokenizer)?
        };

        tracing::info!(
            "Loaded tokenizer from '{}' ({} tokens)",
            self.path.display(),
            tokenizer.vocab_size()
        );
        Ok(tokenizer)
    }
}

/// Build a BERT-style tokenizer in memory from an ordered WordPiece
/// vocabulary. Ids are positions in `pieces`; continuation pieces carry
/// the `##` prefix; `[UNK]`, `[CLS]` and `[SEP]` must be present.
pub fn wordpiece_from_vocab<S: AsRef<str>>(pieces: &[S]) -> error::Result<BertWordPiece> {
    let json      = wordpiece_json(pieces)?;
    let tokenizer = Tokenizer::from_str(&json.to_string()).map_err(Error::tokenizer)?;
    BertWordPiece::new(tokenizer)
}

/// Tokenizer JSON in the HuggingFace format with a WordPiece model.
fn wordpiece_json<S: AsRef<str>>(pieces: &[S]) -> error::Result<serde_json::Value> {
    let mut vocab = serde_json::Map::new();
    for (id, piece) in pieces.iter().enumerate() {
        let piece = piece.as_ref();
        if piece.is_empty() {
            continue;
        }
        if vocab.insert(piece.to_string(), serde_json::json!(id)).is_some() {
            return Err(Error::tokenizer(format!("duplicate vocabulary entry '{piece}'")));
        }
    }
    if !vocab.contains_key(UNK_TOKEN) {
        return Err(Error::tokenizer(format!("'{UNK_TOKEN}' is not in the vocabulary")));
    }

    let added_tokens: Vec<_> = SPECIAL_TOKENS
        .iter()
        .filter_map(|token| vocab.get(*token).map(|id| (token, id)))
        .map(|(token, id)| {
            serde_json::json!({
                "id": id, "content": token, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true
            })
        })
        .collect();

    Ok(serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": added_tokens,
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": null,
            "lowercase": true
        },
        "pre_tokenizer": {
            "type": "BertPreTokenizer"
        },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordPiece",
            "unk_token": UNK_TOKEN,
            "continuing_subword_prefix": "##",
            "max_input_chars_per_word": 100,
            "vocab": vocab
        }
    }))
}
