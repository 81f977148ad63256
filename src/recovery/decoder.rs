// ============================================================
// Recovery Decoder
// ============================================================
// Inverse of the collator: model scores → (intent, slot, value).
//
// Step 1: every intent id whose score is above the threshold is
//         split on `+`/`*` into a triple and emitted directly.
// Step 2: for each valid tag position take the arg-max tag, then
//         keep only the tag of the FIRST subword of each word
//         (new2ori decides which word a subword belongs to).
// Step 3: the span policy groups the word-level BIO tags.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::vocab::LabelVocab;
use crate::domain::example::AlignedExample;
use crate::domain::prediction::SlotTriple;
use crate::error::{Error, Result};
use crate::recovery::policy::{LenientBio, SpanPolicy};

pub const DEFAULT_INTENT_THRESHOLD: f32 = 0.5;

// ─── ExampleScores ────────────────────────────────────────────────────────────
/// Model output for one example.
#[derive(Debug, Clone, Copy)]
pub struct ExampleScores<'s> {
    /// `[I]`
    pub intent_scores: &'s [f32],
    /// `[L, T]`, row-major
    pub tag_scores:    &'s [f32],
    /// `[L]`
    pub tag_mask:      &'s [i64],
    /// T
    pub tag_dim:       usize,
}

// ─── ModelOutput ──────────────────────────────────────────────────────────────
/// Model output for a whole batch, flattened row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub batch_size:    usize,
    pub seq_len:       usize,
    pub intent_dim:    usize,
    pub tag_dim:       usize,
    pub intent_scores: Vec<f32>,
    pub tag_scores:    Vec<f32>,
    pub tag_mask:      Vec<i64>,
}

impl ModelOutput {
    pub fn new(
        batch_size:    usize,
        seq_len:       usize,
        intent_dim:    usize,
        tag_dim:       usize,
        intent_scores: Vec<f32>,
        tag_scores:    Vec<f32>,
        tag_mask:      Vec<i64>,
    ) -> Result<Self> {
        check_len("intent scores", intent_scores.len(), batch_size * intent_dim)?;
        check_len("tag scores", tag_scores.len(), batch_size * seq_len * tag_dim)?;
        check_len("tag mask", tag_mask.len(), batch_size * seq_len)?;
        Ok(Self { batch_size, seq_len, intent_dim, tag_dim, intent_scores, tag_scores, tag_mask })
    }

    /// Read scores back from model tensors:
    /// intents `[B, I]`, tags `[B, L, T]`, tag mask `[B, L]`.
    pub fn from_tensors<B: Backend>(
        intent_scores: Tensor<B, 2>,
        tag_scores:    Tensor<B, 3>,
        tag_mask:      Tensor<B, 2, Int>,
    ) -> Result<Self> {
        let [batch_size, intent_dim]       = intent_scores.dims();
        let [tag_batch, seq_len, tag_dim]  = tag_scores.dims();
        if tag_batch != batch_size || tag_mask.dims() != [batch_size, seq_len] {
            return Err(Error::shape(format!(
                "intent scores {:?}, tag scores {:?} and tag mask {:?} disagree",
                [batch_size, intent_dim],
                [tag_batch, seq_len, tag_dim],
                tag_mask.dims()
            )));
        }

        let intent_scores = intent_scores
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| Error::shape(format!("intent scores: {e:?}")))?;
        let tag_scores = tag_scores
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| Error::shape(format!("tag scores: {e:?}")))?;
        let tag_mask = tag_mask
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .map_err(|e| Error::shape(format!("tag mask: {e:?}")))?;

        Self::new(batch_size, seq_len, intent_dim, tag_dim, intent_scores, tag_scores, tag_mask)
    }

    pub fn row(&self, i: usize) -> ExampleScores<'_> {
        let l = self.seq_len;
        ExampleScores {
            intent_scores: &self.intent_scores[i * self.intent_dim..(i + 1) * self.intent_dim],
            tag_scores:    &self.tag_scores[i * l * self.tag_dim..(i + 1) * l * self.tag_dim],
            tag_mask:      &self.tag_mask[i * l..(i + 1) * l],
            tag_dim:       self.tag_dim,
        }
    }
}

fn check_len(what: &str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(Error::shape(format!("{what}: expected {expected} values, got {got}")));
    }
    Ok(())
}

// ─── ScoreBatch ───────────────────────────────────────────────────────────────
/// Scores for one batch, nested by row, as written to an outputs file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBatch {
    pub intent_scores: Vec<Vec<f32>>,
    pub tag_scores:    Vec<Vec<Vec<f32>>>,
    pub tag_mask:      Vec<Vec<i64>>,
}

impl ScoreBatch {
    /// Flatten into a row-major `ModelOutput`, rejecting ragged rows.
    pub fn into_output(self) -> Result<ModelOutput> {
        let batch_size = self.intent_scores.len();
        let intent_dim = self.intent_scores.first().map_or(0, Vec::len);
        let seq_len    = self.tag_mask.first().map_or(0, Vec::len);
        let tag_dim    = self
            .tag_scores
            .first()
            .and_then(|row| row.first())
            .map_or(0, Vec::len);

        let ragged = self.intent_scores.iter().any(|r| r.len() != intent_dim)
            || self.tag_mask.iter().any(|r| r.len() != seq_len)
            || self.tag_scores.iter().any(|r| {
                r.len() != seq_len || r.iter().any(|pos| pos.len() != tag_dim)
            });
        if ragged {
            return Err(Error::shape("score rows have different lengths"));
        }

        ModelOutput::new(
            batch_size,
            seq_len,
            intent_dim,
            tag_dim,
            self.intent_scores.into_iter().flatten().collect(),
            self.tag_scores.into_iter().flatten().flatten().collect(),
            self.tag_mask.into_iter().flatten().collect(),
        )
    }
}

// ─── RecoveryDecoder ──────────────────────────────────────────────────────────
pub struct RecoveryDecoder<'v> {
    vocab:     &'v LabelVocab,
    threshold: f32,
    policy:    Box<dyn SpanPolicy>,
}

impl<'v> RecoveryDecoder<'v> {
    /// Threshold 0.5, lenient BIO grouping.
    pub fn new(vocab: &'v LabelVocab) -> Self {
        Self {
            vocab,
            threshold: DEFAULT_INTENT_THRESHOLD,
            policy:    Box::new(LenientBio),
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_policy(mut self, policy: impl SpanPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Recover the triples of one example.
    pub fn recover(
        &self,
        scores:  ExampleScores<'_>,
        words:   &[String],
        new2ori: &[usize],
    ) -> Result<Vec<SlotTriple>> {
        if scores.intent_scores.len() != self.vocab.intent_dim() {
            return Err(Error::shape(format!(
                "{} intent scores for {} intents",
                scores.intent_scores.len(),
                self.vocab.intent_dim()
            )));
        }
        if scores.tag_dim != self.vocab.tag_dim()
            || scores.tag_scores.len() != scores.tag_mask.len() * scores.tag_dim
        {
            return Err(Error::shape(format!(
                "{} tag scores for {} positions x {} tags",
                scores.tag_scores.len(),
                scores.tag_mask.len(),
                self.vocab.tag_dim()
            )));
        }

        let mut triples = self.recover_intents(scores.intent_scores)?;

        let subword_tags = self.subword_tags(&scores)?;
        let word_tags    = collapse_to_words(&subword_tags, new2ori, words.len())?;
        triples.extend(self.policy.group_spans(&word_tags, words)?);

        Ok(triples)
    }

    /// Recover every row of a batch; `examples[i]` supplies row i's words
    /// and subword → word map.
    pub fn recover_batch<E: std::borrow::Borrow<AlignedExample>>(
        &self,
        output:   &ModelOutput,
        examples: &[E],
    ) -> Result<Vec<Vec<SlotTriple>>> {
        if examples.len() != output.batch_size {
            return Err(Error::shape(format!(
                "{} examples for a batch of {}",
                examples.len(),
                output.batch_size
            )));
        }
        examples
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let e = e.borrow();
                self.recover(output.row(i), &e.words, &e.new2ori)
            })
            .collect()
    }

    fn recover_intents(&self, intent_scores: &[f32]) -> Result<Vec<SlotTriple>> {
        intent_scores
            .iter()
            .enumerate()
            .filter(|&(_, &score)| score > self.threshold)
            .map(|(id, _)| SlotTriple::parse_intent_label(self.vocab.id_to_intent(id)?))
            .collect()
    }

    /// Arg-max tag of every valid position, boundary positions excluded.
    fn subword_tags(&self, scores: &ExampleScores<'_>) -> Result<Vec<&'v str>> {
        let len = scores.tag_mask.len();
        (1..len.saturating_sub(1))
            .filter(|&pos| scores.tag_mask[pos] == 1)
            .map(|pos| {
                let row = &scores.tag_scores[pos * scores.tag_dim..(pos + 1) * scores.tag_dim];
                self.vocab.id_to_tag(argmax(row))
            })
            .collect()
    }
}

/// Index of the first maximum.
fn argmax(row: &[f32]) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max { (i, v) } else { (best, max) }
        })
        .0
}

/// One tag per original word: the tag of that word's first subword.
fn collapse_to_words<'t>(
    subword_tags: &[&'t str],
    new2ori:      &[usize],
    word_count:   usize,
) -> Result<Vec<Option<&'t str>>> {
    if subword_tags.len() > new2ori.len() {
        return Err(Error::shape(format!(
            "{} valid tag positions but only {} subwords mapped to words",
            subword_tags.len(),
            new2ori.len()
        )));
    }

    let mut word_tags = vec![None; word_count];
    for (k, &tag) in subword_tags.iter().enumerate() {
        let word = new2ori[k];
        let slot = word_tags.get_mut(word).ok_or_else(|| {
            Error::shape(format!("subword {k} maps to word {word} of {word_count}"))
        })?;
        if slot.is_none() {
            *slot = Some(tag);
        }
    }
    Ok(word_tags)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aligner::SubwordAligner;
    use crate::recovery::policy::StrictBio;
    use crate::test_support::{strings, ToyTokenizer};

    fn vocab() -> LabelVocab {
        LabelVocab::new(
            strings(&["inform+food+chinese", "request+area*?", "book+item+table"]),
            strings(&["O", "B-inform+price", "I-inform+price", "B-intent+slot"]),
        )
        .unwrap()
    }

    /// One-hot tag scores reproducing `tags` between the boundary markers.
    fn perfect_scores(vocab: &LabelVocab, tags: &[String]) -> (Vec<f32>, Vec<i64>) {
        let l = tags.len() + 2;
        let t = vocab.tag_dim();
        let mut scores = vec![0.0; l * t];
        let mut mask   = vec![0; l];
        for (k, tag) in tags.iter().enumerate() {
            let id = vocab.tag_to_id(tag).unwrap();
            scores[(k + 1) * t + id] = 1.0;
            mask[k + 1] = 1;
        }
        (scores, mask)
    }

    fn round_trip(words: &[&str], tags: &[&str]) -> Vec<SlotTriple> {
        let vocab   = vocab();
        let tok     = ToyTokenizer::new();
        let words   = strings(words);
        let a       = SubwordAligner::new(&tok).align(&words, tags).unwrap();
        let (tag_scores, tag_mask) = perfect_scores(&vocab, &a.subword_tags);
        let intents = vec![0.0; vocab.intent_dim()];

        let scores = ExampleScores {
            intent_scores: &intents,
            tag_scores:    &tag_scores,
            tag_mask:      &tag_mask,
            tag_dim:       vocab.tag_dim(),
        };
        RecoveryDecoder::new(&vocab).recover(scores, &words, &a.new2ori).unwrap()
    }

    #[test]
    fn test_round_trip_single_word_span() {
        let triples = round_trip(&["book", "a", "table"], &["O", "O", "B-intent+slot"]);
        assert_eq!(triples, vec![SlotTriple::new("intent", "slot", "table")]);
    }

    #[test]
    fn test_round_trip_multi_word_span() {
        let triples = round_trip(
            &["find", "a", "cheap", "chinese", "restaurant"],
            &["O", "O", "B-inform+price", "I-inform+price", "O"],
        );
        assert_eq!(triples, vec![SlotTriple::new("inform", "price", "cheap chinese")]);
    }

    #[test]
    fn test_round_trip_span_over_split_words() {
        // "restaurants" and "chinese" both split into several subwords
        let triples = round_trip(
            &["Chinese", "restaurants!", "please"],
            &["B-inform+price", "I-inform+price", "O"],
        );
        assert_eq!(triples, vec![SlotTriple::new("inform", "price", "Chinese restaurants!")]);
    }

    #[test]
    fn test_intent_threshold_is_strict() {
        let vocab = vocab();
        let scores = ExampleScores {
            intent_scores: &[0.9, 0.5, 0.51],
            tag_scores:    &[],
            tag_mask:      &[],
            tag_dim:       vocab.tag_dim(),
        };
        let triples = RecoveryDecoder::new(&vocab).recover(scores, &[], &[]).unwrap();
        assert_eq!(
            triples,
            vec![
                SlotTriple::new("inform", "food", "chinese"),
                SlotTriple::new("book", "item", "table"),
            ]
        );

        let none = RecoveryDecoder::new(&vocab)
            .with_threshold(0.95)
            .recover(scores, &[], &[])
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_trailing_subword_tags_are_ignored() {
        // word 0 has two subwords; the second predicts B but must be discarded
        let vocab = vocab();
        let words = strings(&["north", "cheap"]);
        let tags  = strings(&["O", "B-inform+price", "B-inform+price"]);
        let (tag_scores, tag_mask) = perfect_scores(&vocab, &tags);
        let scores = ExampleScores {
            intent_scores: &[0.0; 3],
            tag_scores:    &tag_scores,
            tag_mask:      &tag_mask,
            tag_dim:       vocab.tag_dim(),
        };
        let triples = RecoveryDecoder::new(&vocab).recover(scores, &words, &[0, 0, 1]).unwrap();
        assert_eq!(triples, vec![SlotTriple::new("inform", "price", "cheap")]);
    }

    #[test]
    fn test_strict_policy_rejects_orphan() {
        let vocab = vocab();
        let words = strings(&["very", "cheap"]);
        let tags  = strings(&["O", "I-inform+price"]);
        let (tag_scores, tag_mask) = perfect_scores(&vocab, &tags);
        let scores = ExampleScores {
            intent_scores: &[0.0; 3],
            tag_scores:    &tag_scores,
            tag_mask:      &tag_mask,
            tag_dim:       vocab.tag_dim(),
        };

        let lenient = RecoveryDecoder::new(&vocab).recover(scores, &words, &[0, 1]).unwrap();
        assert!(lenient.is_empty());

        let strict = RecoveryDecoder::new(&vocab)
            .with_policy(StrictBio)
            .recover(scores, &words, &[0, 1]);
        assert!(matches!(strict, Err(Error::MalformedSpan(_))));
    }

    #[test]
    fn test_shape_checks() {
        let vocab = vocab();
        let scores = ExampleScores {
            intent_scores: &[0.0; 2],
            tag_scores:    &[],
            tag_mask:      &[],
            tag_dim:       vocab.tag_dim(),
        };
        assert!(matches!(
            RecoveryDecoder::new(&vocab).recover(scores, &[], &[]),
            Err(Error::ShapeMismatch(_))
        ));

        assert!(ModelOutput::new(1, 3, 2, 2, vec![0.0; 2], vec![0.0; 5], vec![0; 3]).is_err());
    }

    #[test]
    fn test_from_tensors() {
        type B = burn::backend::NdArray;
        let device = Default::default();

        let intents = Tensor::<B, 1>::from_floats([0.9f32, 0.1, 0.2].as_slice(), &device)
            .reshape([1, 3]);
        let mut tags = vec![0.0f32; 4 * 4];
        tags[4 + 1] = 1.0; // position 1 → B-inform+price
        tags[2 * 4] = 1.0; // position 2 → O
        let tags = Tensor::<B, 1>::from_floats(tags.as_slice(), &device).reshape([1, 4, 4]);
        let mask = Tensor::<B, 1, Int>::from_ints([0i32, 1, 1, 0].as_slice(), &device)
            .reshape([1, 4]);

        let output = ModelOutput::from_tensors(intents, tags, mask).unwrap();
        assert_eq!((output.batch_size, output.seq_len, output.tag_dim), (1, 4, 4));

        let vocab   = vocab();
        let row     = output.row(0);
        let words   = strings(&["cheap", "please"]);
        let triples = RecoveryDecoder::new(&vocab).recover(row, &words, &[0, 1]).unwrap();
        assert_eq!(
            triples,
            vec![
                SlotTriple::new("inform", "food", "chinese"),
                SlotTriple::new("inform", "price", "cheap"),
            ]
        );
    }

    #[test]
    fn test_ragged_scores_rejected() {
        let batch = ScoreBatch {
            intent_scores: vec![vec![0.1, 0.2], vec![0.3]],
            tag_scores:    vec![vec![vec![1.0]], vec![vec![1.0]]],
            tag_mask:      vec![vec![0], vec![0]],
        };
        assert!(matches!(batch.into_output(), Err(Error::ShapeMismatch(_))));

        let even = ScoreBatch {
            intent_scores: vec![vec![0.1, 0.2], vec![0.3, 0.4]],
            tag_scores:    vec![vec![vec![1.0, 0.0]], vec![vec![0.0, 1.0]]],
            tag_mask:      vec![vec![1], vec![1]],
        };
        let output = even.into_output().unwrap();
        assert_eq!((output.batch_size, output.seq_len, output.intent_dim, output.tag_dim), (2, 1, 2, 2));
        assert_eq!(output.tag_scores, vec![1.0, 0.0, 0.0, 1.0]);
    }
}
