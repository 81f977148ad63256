// ============================================================
// Layer 4 — Subword Aligner
// ============================================================
// Maps whole-word BIO tags onto a subword tokenisation.
//
// The sentence is re-tokenised in two stages:
//
//   "Find a CHEAP chinese-restaurant"
//       │  basic_tokenize (lowercase, split punctuation)
//       ▼
//   find | a | cheap | chinese | - | restaurant
//       │  subword_tokenize (per token)
//       ▼
//   find | a | cheap | chin ##ese | - | rest ##aur ##ant
//
// Stage one may split a whitespace word into several tokens
// ("chinese-restaurant" → 3 tokens), so a `WordCursor` keeps an
// accumulator of the text seen so far for the current word and
// only advances once it matches the word's stage-one form.
//
// Tagging rule: only the FIRST subword of the FIRST stage-one
// token of a word keeps the word's tag; every other piece is "O".
// That keeps exactly one B-tag per span start.

use std::collections::BTreeSet;

use crate::data::vocab::LabelVocab;
use crate::domain::example::{AlignedExample, WordExample};
use crate::domain::traits::SubwordTokenizer;
use crate::error::{Error, Result};

/// Tag assigned to every subword that does not start a word.
pub const OUTSIDE: &str = "O";

// ─── WordCursor ───────────────────────────────────────────────────────────────
/// Accumulator state for the word currently being consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CursorState {
    /// The next stage-one token starts a new word.
    AwaitingWordStart,
    /// Lowercased text consumed so far for the current word.
    Accumulating(String),
}

/// Where one stage-one token lands in the original word sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPlacement {
    pub word_index:    usize,
    /// True for the first stage-one token of its word.
    pub is_word_start: bool,
}

/// Walks the original words while stage-one tokens are fed in.
///
/// `normalize` renders one original word the way stage one would
/// (tokens concatenated without separators). Tokens are matched against
/// that form, lowercased, so stripped accents and dropped control
/// characters never leave a word half-consumed.
#[derive(Debug)]
pub struct WordCursor<'w> {
    words: &'w [String],
    index: usize,
    state: CursorState,
}

impl<'w> WordCursor<'w> {
    pub fn new(words: &'w [String]) -> Self {
        Self {
            words,
            index: 0,
            state: CursorState::AwaitingWordStart,
        }
    }

    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, CursorState::Accumulating(_))
    }

    /// Feed one stage-one token and report which word it belongs to.
    pub fn advance(
        &mut self,
        token:     &str,
        normalize: &dyn Fn(&str) -> Result<String>,
    ) -> Result<TokenPlacement> {
        let token = token.to_lowercase();

        loop {
            let word = self.words.get(self.index).ok_or_else(|| {
                Error::alignment(format!(
                    "token '{token}' left over after all {} words were consumed",
                    self.words.len()
                ))
            })?;

            let is_word_start = self.state == CursorState::AwaitingWordStart;
            let candidate = match &self.state {
                CursorState::AwaitingWordStart => token.clone(),
                CursorState::Accumulating(acc) => format!("{acc}{token}"),
            };
            let placement = TokenPlacement { word_index: self.index, is_word_start };

            let key = normalize(word)?.to_lowercase();
            if candidate == key {
                return Ok(self.complete(placement));
            }
            if key.starts_with(&candidate) {
                self.state = CursorState::Accumulating(candidate);
                return Ok(placement);
            }
            if key.is_empty() && is_word_start {
                // the word disappears under normalisation; skip it
                tracing::trace!("word {} ('{}') vanished during tokenisation", self.index, word);
                self.index += 1;
                continue;
            }

            return Err(Error::alignment(format!(
                "cannot reconcile '{candidate}' with word {} ('{word}')",
                self.index
            )));
        }
    }

    /// Check nothing is left half-consumed and every unvisited word vanishes.
    pub fn finish(self, normalize: &dyn Fn(&str) -> Result<String>) -> Result<()> {
        if let CursorState::Accumulating(acc) = &self.state {
            return Err(Error::alignment(format!(
                "input ended while word {} ('{}') was only matched up to '{acc}'",
                self.index, self.words[self.index]
            )));
        }
        for (i, word) in self.words.iter().enumerate().skip(self.index) {
            if !normalize(word)?.is_empty() {
                return Err(Error::alignment(format!(
                    "word {i} ('{word}') produced no tokens"
                )));
            }
        }
        Ok(())
    }

    fn complete(&mut self, placement: TokenPlacement) -> TokenPlacement {
        self.state = CursorState::AwaitingWordStart;
        self.index += 1;
        placement
    }
}

// ─── Alignment ────────────────────────────────────────────────────────────────
/// Subword tokens, their tags and the subword → word index map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub subword_tokens: Vec<String>,
    pub subword_tags:   Vec<String>,
    pub new2ori:        Vec<usize>,
}

// ─── SubwordAligner ───────────────────────────────────────────────────────────
pub struct SubwordAligner<'t, T: SubwordTokenizer + ?Sized> {
    tokenizer: &'t T,
}

impl<'t, T: SubwordTokenizer + ?Sized> SubwordAligner<'t, T> {
    pub fn new(tokenizer: &'t T) -> Self {
        Self { tokenizer }
    }

    /// Align word-level tags to subword tokens.
    pub fn align<S: AsRef<str>>(&self, words: &[String], tags: &[S]) -> Result<Alignment> {
        if words.len() != tags.len() {
            return Err(Error::alignment(format!(
                "{} words but {} tags",
                words.len(),
                tags.len()
            )));
        }

        let basic_tokens = self.tokenizer.basic_tokenize(&words.join(" "))?;
        let normalize = |word: &str| -> Result<String> {
            Ok(self.tokenizer.basic_tokenize(word)?.concat())
        };

        let mut cursor = WordCursor::new(words);
        let mut out = Alignment {
            subword_tokens: Vec::with_capacity(basic_tokens.len()),
            subword_tags:   Vec::with_capacity(basic_tokens.len()),
            new2ori:        Vec::with_capacity(basic_tokens.len()),
        };

        for token in &basic_tokens {
            let placement = cursor.advance(token, &normalize)?;
            let pieces    = self.tokenizer.subword_tokenize(token)?;
            if pieces.is_empty() {
                return Err(Error::alignment(format!(
                    "token '{token}' of word {} produced no subword units",
                    placement.word_index
                )));
            }

            for (n, piece) in pieces.into_iter().enumerate() {
                let tag = if placement.is_word_start && n == 0 {
                    tags[placement.word_index].as_ref()
                } else {
                    OUTSIDE
                };
                out.new2ori.push(placement.word_index);
                out.subword_tokens.push(piece);
                out.subword_tags.push(tag.to_string());
            }
        }

        cursor.finish(&normalize)?;
        Ok(out)
    }

    /// Align one example and encode its tags and intents as ids.
    pub fn align_example(&self, example: &WordExample, vocab: &LabelVocab) -> Result<AlignedExample> {
        example.validate()?;
        let alignment  = self.align(&example.words, &example.tags)?;
        let tag_ids    = vocab.tag_ids(&alignment.subword_tags)?;
        let intent_ids = vocab
            .intent_ids(&example.intents)?
            .into_iter()
            .collect::<BTreeSet<_>>();

        Ok(AlignedExample {
            words:          example.words.clone(),
            tags:           example.tags.clone(),
            intents:        example.intents.clone(),
            new2ori:        alignment.new2ori,
            subword_tokens: alignment.subword_tokens,
            tag_ids,
            intent_ids,
        })
    }
}
