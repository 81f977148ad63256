// ============================================================
// Layer 4 — Prepared Corpus
// ============================================================
// The top-level loader. Owns everything derived from one raw
// corpus and one tokenizer:
//
//   RawCorpus ──► SubwordAligner ──► aligned splits
//                                        │
//                          train split ──┴──► ClassWeights
//
// Built once, then read-only. The tokenizer is NOT stored: the
// aligned splits already hold subword strings, and id lookup at
// padding time takes the tokenizer as an argument. That keeps
// the prepared corpus serializable to `prepared.json`.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::aligner::SubwordAligner;
use crate::data::collator::{batch_count, BatchCollator, ExhaustiveBatches, PaddedBatch};
use crate::data::dataset::AlignedDataset;
use crate::data::vocab::LabelVocab;
use crate::data::weights::{ClassWeights, DegeneratePolicy};
use crate::domain::example::{AlignedExample, RawCorpus, Split};
use crate::domain::prediction::SlotTriple;
use crate::domain::traits::SubwordTokenizer;
use crate::error::{Error, Result};
use crate::recovery::decoder::{ModelOutput, RecoveryDecoder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedCorpus {
    vocab:          LabelVocab,
    splits:         BTreeMap<Split, Vec<AlignedExample>>,
    intent_weights: ClassWeights,
}

/// Size summary of one aligned split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitStats {
    pub split:          Split,
    pub examples:       usize,
    pub subword_tokens: usize,
    /// Longest `subword_tokens` in the split, boundary markers excluded.
    pub longest:        usize,
    pub batches:        usize,
}

impl PreparedCorpus {
    /// Align every split and estimate intent weights from train.
    pub fn build<T: SubwordTokenizer + ?Sized>(
        raw:       &RawCorpus,
        vocab:     LabelVocab,
        tokenizer: &T,
        policy:    DegeneratePolicy,
    ) -> Result<Self> {
        let aligner = SubwordAligner::new(tokenizer);
        let mut splits = BTreeMap::new();

        for split in Split::ALL {
            let examples = raw.get(&split).map(Vec::as_slice).unwrap_or_default();
            let aligned  = examples
                .iter()
                .enumerate()
                .map(|(i, example)| {
                    aligner.align_example(example, &vocab).inspect_err(|e| {
                        tracing::warn!("Cannot align {}[{}]: {}", split, i, e);
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            tracing::debug!(
                "Aligned {} {} examples into {} subword tokens",
                aligned.len(),
                split,
                aligned.iter().map(AlignedExample::len).sum::<usize>()
            );
            splits.insert(split, aligned);
        }

        let intent_weights = ClassWeights::estimate(&splits[&Split::Train], &vocab, policy)?;
        tracing::info!(
            "Prepared corpus: {} intents, {} tags",
            vocab.intent_dim(),
            vocab.tag_dim()
        );

        Ok(Self { vocab, splits, intent_weights })
    }

    pub fn vocab(&self) -> &LabelVocab {
        &self.vocab
    }

    pub fn intent_weights(&self) -> &ClassWeights {
        &self.intent_weights
    }

    /// Aligned examples of one split, in stored order.
    pub fn split(&self, split: Split) -> &[AlignedExample] {
        self.splits.get(&split).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn collator<'a, T: SubwordTokenizer + ?Sized>(&self, tokenizer: &'a T) -> BatchCollator<'a, T> {
        BatchCollator::new(tokenizer, &self.vocab)
    }

    /// A training batch: `batch_size` draws with replacement from train.
    pub fn sample_batch<T, R>(
        &self,
        tokenizer:  &T,
        batch_size: usize,
        rng:        &mut R,
    ) -> Result<PaddedBatch>
    where
        T: SubwordTokenizer + ?Sized,
        R: Rng + ?Sized,
    {
        self.collator(tokenizer)
            .sampled_batch(self.split(Split::Train), batch_size, rng)
    }

    /// Every example of `split` exactly once, in order, with true chunk sizes.
    pub fn batches<'a, T: SubwordTokenizer + ?Sized>(
        &'a self,
        tokenizer:  &'a T,
        split:      Split,
        batch_size: usize,
    ) -> Result<ExhaustiveBatches<'a, T>> {
        self.collator(tokenizer)
            .exhaustive_batches(self.split(split), batch_size)
    }

    /// Encoded rows of one split for burn's DataLoader.
    pub fn dataset<T: SubwordTokenizer + ?Sized>(
        &self,
        tokenizer: &T,
        split:     Split,
    ) -> Result<AlignedDataset> {
        AlignedDataset::from_examples(self.split(split), &self.collator(tokenizer))
    }

    /// A decoder over this corpus' vocabulary with default settings.
    pub fn decoder(&self) -> RecoveryDecoder<'_> {
        RecoveryDecoder::new(&self.vocab)
    }

    /// Recover the triples of one model-output batch whose rows are
    /// `split[offset..offset + output.batch_size]`.
    pub fn recover(
        &self,
        decoder: &RecoveryDecoder<'_>,
        split:   Split,
        offset:  usize,
        output:  &ModelOutput,
    ) -> Result<Vec<Vec<SlotTriple>>> {
        let examples = self.split(split);
        let rows     = examples.get(offset..offset + output.batch_size).ok_or_else(|| {
            Error::shape(format!(
                "batch of {} at offset {} overruns {} split of {}",
                output.batch_size,
                offset,
                split,
                examples.len()
            ))
        })?;
        decoder.recover_batch(output, rows)
    }

    pub fn stats(&self, batch_size: usize) -> Vec<SplitStats> {
        Split::ALL
            .iter()
            .map(|&split| {
                let examples = self.split(split);
                SplitStats {
                    split,
                    examples:       examples.len(),
                    subword_tokens: examples.iter().map(AlignedExample::len).sum(),
                    longest:        examples.iter().map(AlignedExample::len).max().unwrap_or(0),
                    batches:        batch_count(examples.len(), batch_size),
                }
            })
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::example::WordExample;
    use crate::test_support::{strings, ToyTokenizer};
    use rand::{rngs::StdRng, SeedableRng};

    fn vocab() -> LabelVocab {
        LabelVocab::new(
            strings(&["inform+food+chinese", "request+phone+none"]),
            strings(&["O", "B-inform+area", "I-inform+area"]),
        )
        .unwrap()
    }

    fn ex(words: &[&str], tags: &[&str], intents: &[&str]) -> WordExample {
        WordExample::new(strings(words), strings(tags), strings(intents)).unwrap()
    }

    fn raw() -> RawCorpus {
        let mut raw = RawCorpus::new();
        raw.insert(
            Split::Train,
            vec![
                ex(&["chinese", "food"], &["O", "O"], &["inform+food+chinese"]),
                ex(&["phone", "number", "please"], &["O", "O", "O"], &["request+phone+none"]),
                ex(&["in", "the", "city", "centre"], &["O", "O", "B-inform+area", "I-inform+area"], &[]),
            ],
        );
        raw.insert(
            Split::Test,
            vec![
                ex(&["somewhere", "downtown"], &["B-inform+area", "I-inform+area"], &[]),
                ex(&["phone"], &["O"], &["request+phone+none"]),
                ex(&["chinese", "please"], &["O", "O"], &["inform+food+chinese"]),
            ],
        );
        raw
    }

    fn prepared() -> PreparedCorpus {
        PreparedCorpus::build(&raw(), vocab(), &ToyTokenizer::new(), DegeneratePolicy::Fail).unwrap()
    }

    /// One-hot scores that reproduce the gold labels of `rows`.
    fn gold_output(corpus: &PreparedCorpus, rows: &[AlignedExample], batch: &PaddedBatch) -> ModelOutput {
        let (intent_dim, tag_dim, seq_len) = (corpus.vocab().intent_dim(), corpus.vocab().tag_dim(), batch.seq_len);
        let mut intent_scores = vec![0.0; rows.len() * intent_dim];
        let mut tag_scores    = vec![0.0; rows.len() * seq_len * tag_dim];
        for (i, row) in rows.iter().enumerate() {
            for &id in &row.intent_ids {
                intent_scores[i * intent_dim + id] = 0.9;
            }
            for (j, &tag) in row.tag_ids.iter().enumerate() {
                tag_scores[(i * seq_len + 1 + j) * tag_dim + tag] = 1.0;
            }
        }
        ModelOutput::new(
            rows.len(), seq_len, intent_dim, tag_dim,
            intent_scores, tag_scores, batch.tag_mask.clone(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_aligns_every_split() {
        let corpus = prepared();
        assert_eq!(corpus.split(Split::Train).len(), 3);
        assert!(corpus.split(Split::Valid).is_empty());
        assert_eq!(corpus.split(Split::Test).len(), 3);

        // "somewhere" → "some" "##whe" "##re"; only the head keeps the tag
        let first = &corpus.split(Split::Test)[0];
        assert_eq!(first.subword_tokens, strings(&["some", "##whe", "##re", "down", "##tow", "##n"]));
        assert_eq!(first.new2ori, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(first.tag_ids, vec![1, 0, 0, 2, 0, 0]);
    }

    #[test]
    fn test_weights_come_from_train_only() {
        let corpus = prepared();
        // 1 of 3 train examples carries each intent
        for id in 0..2 {
            assert!((corpus.intent_weights().get(id).unwrap() - 2f64.ln()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_degenerate_train_split_fails() {
        let mut raw = raw();
        raw.get_mut(&Split::Train).unwrap().truncate(1);
        let result = PreparedCorpus::build(&raw, vocab(), &ToyTokenizer::new(), DegeneratePolicy::Fail);
        assert!(matches!(result, Err(Error::DegenerateVocabulary { .. })));

        let floored = PreparedCorpus::build(&raw, vocab(), &ToyTokenizer::new(), DegeneratePolicy::Floor(1.0));
        assert!(floored.is_ok());
    }

    #[test]
    fn test_unknown_tag_fails_build() {
        let mut raw = raw();
        raw.get_mut(&Split::Test).unwrap().push(ex(&["x"], &["B-nope+nope"], &[]));
        let result = PreparedCorpus::build(&raw, vocab(), &ToyTokenizer::new(), DegeneratePolicy::Fail);
        assert!(matches!(result, Err(Error::UnknownLabel { .. })));
    }

    #[test]
    fn test_sample_batch_is_seeded() {
        let corpus = prepared();
        let tok    = ToyTokenizer::new();
        let a = corpus.sample_batch(&tok, 8, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = corpus.sample_batch(&tok, 8, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.batch_size, 8);
    }

    #[test]
    fn test_batches_and_recover_round_trip() {
        let corpus  = prepared();
        let tok     = ToyTokenizer::new();
        let decoder = corpus.decoder();
        let test    = corpus.split(Split::Test);

        let mut offset = 0;
        let mut recovered = Vec::new();
        for item in corpus.batches(&tok, Split::Test, 2).unwrap() {
            let (batch, size) = item.unwrap();
            let output = gold_output(&corpus, &test[offset..offset + size], &batch);
            recovered.extend(corpus.recover(&decoder, Split::Test, offset, &output).unwrap());
            offset += size;
        }

        assert_eq!(offset, 3);
        assert_eq!(recovered[0], vec![SlotTriple::new("inform", "area", "somewhere downtown")]);
        assert_eq!(recovered[1], vec![SlotTriple::new("request", "phone", "none")]);
        assert_eq!(recovered[2], vec![SlotTriple::new("inform", "food", "chinese")]);
    }

    #[test]
    fn test_recover_rejects_overrun() {
        let corpus = prepared();
        let tok    = ToyTokenizer::new();
        let (batch, _) = corpus.batches(&tok, Split::Test, 2).unwrap().next().unwrap().unwrap();
        let output = gold_output(&corpus, &corpus.split(Split::Test)[..2], &batch);
        assert!(matches!(
            corpus.recover(&corpus.decoder(), Split::Test, 2, &output),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_dataset_and_stats() {
        let corpus = prepared();
        let data   = corpus.dataset(&ToyTokenizer::new(), Split::Train).unwrap();
        assert_eq!(data.row_count(), 3);

        let stats = corpus.stats(2);
        assert_eq!(stats[0].split, Split::Train);
        assert_eq!(stats[0].batches, 2);
        assert_eq!(stats[1].examples, 0);
        assert_eq!(stats[1].batches, 0);
        assert_eq!(stats[2].longest, 6);
    }

    #[test]
    fn test_json_round_trip() {
        let corpus = prepared();
        let json   = serde_json::to_string(&corpus).unwrap();
        let back: PreparedCorpus = serde_json::from_str(&json).unwrap();
        assert_eq!(back.vocab(), corpus.vocab());
        assert_eq!(back.split(Split::Test), corpus.split(Split::Test));
        for (a, b) in back.intent_weights().as_slice().iter().zip(corpus.intent_weights().as_slice()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
