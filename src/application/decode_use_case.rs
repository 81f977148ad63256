// ============================================================
// Layer 2 — DecodeUseCase
// ============================================================
// Turns saved model scores back into (intent, slot, value)
// triples for one split of a prepared corpus:
//
//   Step 1: Load prepared.json + prepare_config.json   (Layer 6)
//   Step 2: Read the score batches from outputs_path   (Layer 6)
//   Step 3: Recover each batch in order                (recovery)
//
// The outputs file holds the model's scores for the split's
// exhaustive batches, in order:
//
//   [
//     {"intent_scores": [[...I...], ...B rows],
//      "tag_scores":    [[[...T...], ...L positions], ...B rows],
//      "tag_mask":      [[...L...], ...B rows]},
//     ...
//   ]

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::example::Split;
use crate::domain::prediction::SlotTriple;
use crate::infra::{artifacts::ArtifactStore, score_reader::read_score_batches};
use crate::recovery::StrictBio;

// ─── Decode Configuration ────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeConfig {
    pub prepared_dir:     String,
    pub outputs_path:     String,
    pub split:            Split,
    /// Falls back to the threshold saved by `prepare`.
    pub intent_threshold: Option<f32>,
    /// Reject `I-` tags that do not continue an open span.
    pub strict_bio:       bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            prepared_dir:     "prepared".to_string(),
            outputs_path:     "outputs.json".to_string(),
            split:            Split::Test,
            intent_threshold: None,
            strict_bio:       false,
        }
    }
}

// ─── DecodeUseCase ───────────────────────────────────────────────────────────
pub struct DecodeUseCase {
    config: DecodeConfig,
}

impl DecodeUseCase {
    pub fn new(config: DecodeConfig) -> Self {
        Self { config }
    }

    /// One triple list per example of the split, in stored order.
    pub fn execute(&self) -> Result<Vec<Vec<SlotTriple>>> {
        let cfg = &self.config;

        // ── Step 1: Load artifacts ────────────────────────────────────────────
        let store     = ArtifactStore::new(&cfg.prepared_dir);
        let prepared  = store.load_prepared()?;
        let threshold = match cfg.intent_threshold {
            Some(t) => t,
            None => store.load_config()?.intent_threshold,
        };

        let mut decoder = prepared.decoder().with_threshold(threshold);
        if cfg.strict_bio {
            decoder = decoder.with_policy(StrictBio);
        }

        // ── Step 2: Read score batches ────────────────────────────────────────
        let batches = read_score_batches(&cfg.outputs_path)?;
        tracing::info!(
            "Decoding {} batches for the {} split (threshold {})",
            batches.len(),
            cfg.split,
            threshold
        );

        // ── Step 3: Recover in order ──────────────────────────────────────────
        let mut offset    = 0;
        let mut recovered = Vec::with_capacity(prepared.split(cfg.split).len());
        for (i, batch) in batches.into_iter().enumerate() {
            let output = batch
                .into_output()
                .with_context(|| format!("Batch {i}"))?;
            let triples = prepared
                .recover(&decoder, cfg.split, offset, &output)
                .with_context(|| format!("Cannot decode batch {i}"))?;
            offset += output.batch_size;
            recovered.extend(triples);
        }

        let expected = prepared.split(cfg.split).len();
        if offset != expected {
            tracing::warn!("Decoded {} of {} {} examples", offset, expected, cfg.split);
        }
        ensure!(offset <= expected, "more rows than examples in the {} split", cfg.split);

        Ok(recovered)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::prepare_use_case::{
        tests::{config, write_corpus},
        PrepareUseCase,
    };
    use crate::infra::tokenizer_store::TokenizerStore;
    use crate::recovery::ScoreBatch;
    use std::path::Path;

    /// Prepare the toy corpus and write one-hot gold scores for its test split.
    fn setup(root: &Path, batch_size: usize) -> DecodeConfig {
        std::fs::create_dir(root.join("data")).unwrap();
        write_corpus(&root.join("data"));
        let prep = config(root);
        PrepareUseCase::new(prep.clone()).execute().unwrap();

        let prepared  = ArtifactStore::new(&prep.output_dir).load_prepared().unwrap();
        let tokenizer = TokenizerStore::new(&prep.tokenizer_path).load().unwrap();
        let (intent_dim, tag_dim) = (prepared.vocab().intent_dim(), prepared.vocab().tag_dim());

        let mut offset  = 0;
        let mut batches = Vec::new();
        for item in prepared.batches(&tokenizer, Split::Test, batch_size).unwrap() {
            let (padded, size) = item.unwrap();
            let rows = &prepared.split(Split::Test)[offset..offset + size];
            offset += size;

            batches.push(ScoreBatch {
                intent_scores: rows
                    .iter()
                    .map(|r| (0..intent_dim).map(|i| if r.intent_ids.contains(&i) { 0.8 } else { 0.1 }).collect())
                    .collect(),
                tag_scores: rows
                    .iter()
                    .map(|r| {
                        (0..padded.seq_len)
                            .map(|pos| {
                                let mut scores = vec![0.0; tag_dim];
                                if pos >= 1 && pos <= r.tag_ids.len() {
                                    scores[r.tag_ids[pos - 1]] = 1.0;
                                }
                                scores
                            })
                            .collect()
                    })
                    .collect(),
                tag_mask: (0..size).map(|i| padded.tag_mask_row(i).to_vec()).collect(),
            });
        }

        let outputs = root.join("outputs.json");
        std::fs::write(&outputs, serde_json::to_string(&batches).unwrap()).unwrap();
        DecodeConfig {
            prepared_dir: prep.output_dir,
            outputs_path: outputs.display().to_string(),
            ..DecodeConfig::default()
        }
    }

    #[test]
    fn test_decode_recovers_gold_triples() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = setup(tmp.path(), 1);

        let recovered = DecodeUseCase::new(cfg).execute().unwrap();
        assert_eq!(recovered.len(), 2);

        let mut first = recovered[0].clone();
        first.sort_by(|a, b| (&a.slot, &a.value).cmp(&(&b.slot, &b.value)));
        first.dedup();
        assert_eq!(
            first,
            vec![
                SlotTriple::new("inform", "area", "city centre"),
                SlotTriple::new("inform", "price", "cheap"),
            ]
        );
        assert_eq!(recovered[1], vec![SlotTriple::new("bye", "none", "none")]);
    }

    #[test]
    fn test_threshold_override_drops_intents() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = DecodeConfig { intent_threshold: Some(0.9), ..setup(tmp.path(), 2) };

        let recovered = DecodeUseCase::new(cfg).execute().unwrap();
        // only the span-derived triples remain
        assert!(recovered[1].is_empty());
        assert!(recovered[0].contains(&SlotTriple::new("inform", "price", "cheap")));
    }
}
