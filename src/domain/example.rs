// ============================================================
// Layer 3 — Example Domain Types
// ============================================================
// A word-level example is what annotators produce:
//
//   words:   ["find", "a",  "cheap",          "restaurant"]
//   tags:    ["O",    "O",  "B-inform+price", "O"]
//   intents: ["inform+price+cheap"]
//
// An aligned example is the same utterance after subword
// alignment and id encoding. `new2ori[k]` is the index of
// the original word that subword `k` came from.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ─── Split ────────────────────────────────────────────────────────────────────
/// One named partition of the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    #[serde(alias = "val", alias = "dev")]
    Valid,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Valid, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test  => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(Split::Train),
            "valid" | "val" | "dev" => Ok(Split::Valid),
            "test" => Ok(Split::Test),
            other => Err(Error::invalid_config(format!("unknown split '{other}'"))),
        }
    }
}

/// Word-level examples keyed by split, as read from disk.
pub type RawCorpus = BTreeMap<Split, Vec<WordExample>>;

// ─── WordExample ──────────────────────────────────────────────────────────────
/// A whitespace-tokenised utterance with one BIO tag per word
/// and its set of `intent+slot+value` labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawExample")]
pub struct WordExample {
    pub words:   Vec<String>,
    pub tags:    Vec<String>,
    pub intents: Vec<String>,
}

/// Accepts both `[words, tags, intents]` and the named-field form.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawExample {
    Tuple(Vec<String>, Vec<String>, Vec<String>),
    Named {
        words: Vec<String>,
        tags:  Vec<String>,
        #[serde(default)]
        intents: Vec<String>,
    },
}

impl From<RawExample> for WordExample {
    fn from(raw: RawExample) -> Self {
        match raw {
            RawExample::Tuple(words, tags, intents) => Self { words, tags, intents },
            RawExample::Named { words, tags, intents } => Self { words, tags, intents },
        }
    }
}

impl WordExample {
    /// Build an example, rejecting a word/tag length mismatch.
    pub fn new<S: Into<String>>(
        words:   impl IntoIterator<Item = S>,
        tags:    impl IntoIterator<Item = S>,
        intents: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let example = Self {
            words:   words.into_iter().map(Into::into).collect(),
            tags:    tags.into_iter().map(Into::into).collect(),
            intents: intents.into_iter().map(Into::into).collect(),
        };
        example.validate()?;
        Ok(example)
    }

    pub fn validate(&self) -> Result<()> {
        if self.words.len() != self.tags.len() {
            return Err(Error::invalid_config(format!(
                "{} words but {} tags in '{}'",
                self.words.len(),
                self.tags.len(),
                self.words.join(" ")
            )));
        }
        Ok(())
    }
}

// ─── AlignedExample ───────────────────────────────────────────────────────────
/// A word-level example plus its subword alignment and id encoding.
///
/// `subword_tokens`, `tag_ids` and `new2ori` always have the same length;
/// boundary markers are NOT included (they are added at padding time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedExample {
    pub words:          Vec<String>,
    pub tags:           Vec<String>,
    pub intents:        Vec<String>,
    pub new2ori:        Vec<usize>,
    pub subword_tokens: Vec<String>,
    pub tag_ids:        Vec<usize>,
    pub intent_ids:     BTreeSet<usize>,
}

impl AlignedExample {
    /// Number of subword tokens, excluding boundary markers.
    pub fn len(&self) -> usize {
        self.subword_tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subword_tokens.is_empty()
    }

    /// Length once `[CLS]`/`[SEP]` are wrapped around the tokens.
    pub fn padded_len(&self) -> usize {
        self.len() + 2
    }
}
