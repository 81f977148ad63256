// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Orchestrates the full preparation pipeline in order:
//
//   Step 1: Load corpus + label vocabularies  (Layer 4 - data)
//   Step 2: Load tokenizer                    (Layer 6 - infra)
//   Step 3: Align splits + class weights      (Layer 4 - data)
//   Step 4: Encode every split once           (Layer 4 - data)
//   Step 5: Preview one sampled train batch   (Layer 4 - data)
//   Step 6: Save artifacts and statistics     (Layer 6 - infra)

use anyhow::{ensure, Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{
    loader::JsonCorpusLoader,
    prepared::{PreparedCorpus, SplitStats},
    vocab::LabelVocab,
    weights::DegeneratePolicy,
};
use crate::domain::example::Split;
use crate::domain::traits::CorpusSource;
use crate::infra::{
    artifacts::ArtifactStore,
    metrics::StatsLogger,
    tokenizer_store::TokenizerStore,
};
use crate::recovery::decoder::DEFAULT_INTENT_THRESHOLD;

// ─── Prepare Configuration ───────────────────────────────────────────────────
// Saved next to the artifacts so `decode` can reuse it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    pub data_dir:         String,
    pub tokenizer_path:   String,
    pub output_dir:       String,
    pub batch_size:       usize,
    pub intent_threshold: f32,
    /// Replace zero positive/negative counts with this value instead of failing.
    pub weight_floor:     Option<f64>,
    pub seed:             u64,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            data_dir:         "data".to_string(),
            tokenizer_path:   "data/tokenizer.json".to_string(),
            output_dir:       "prepared".to_string(),
            batch_size:       32,
            intent_threshold: DEFAULT_INTENT_THRESHOLD,
            weight_floor:     None,
            seed:             42,
        }
    }
}

impl PrepareConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "batch_size must be positive");
        ensure!(
            self.intent_threshold.is_finite(),
            "intent_threshold must be a finite number"
        );
        if let Some(floor) = self.weight_floor {
            ensure!(floor > 0.0, "weight_floor must be positive, got {floor}");
        }
        Ok(())
    }
}

// ─── PrepareUseCase ──────────────────────────────────────────────────────────
pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline end to end and return per-split statistics.
    pub fn execute(&self) -> Result<Vec<SplitStats>> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load corpus and vocabularies ──────────────────────────────
        tracing::info!("Loading corpus from '{}'", cfg.data_dir);
        let loader           = JsonCorpusLoader::new(&cfg.data_dir);
        let raw              = loader.load_corpus()?;
        let (intents, tags)  = loader.load_vocabularies()?;
        let vocab            = LabelVocab::new(intents, tags)
            .context("Invalid label vocabulary")?;

        // ── Step 2: Load tokenizer ────────────────────────────────────────────
        let tokenizer = TokenizerStore::new(&cfg.tokenizer_path).load()?;

        // ── Step 3: Align every split, estimate weights from train ────────────
        let policy   = DegeneratePolicy::from(cfg.weight_floor);
        let prepared = PreparedCorpus::build(&raw, vocab, &tokenizer, policy)
            .context("Cannot prepare corpus")?;

        // ── Step 4: Encode every split once ───────────────────────────────────
        // Surfaces tokens missing from the vocabulary now instead of at
        // training time.
        for split in Split::ALL {
            let mut rows = 0;
            for batch in prepared.batches(&tokenizer, split, cfg.batch_size)? {
                let (_, size) = batch.with_context(|| format!("Cannot pad {split} split"))?;
                rows += size;
            }
            tracing::debug!("Encoded {} {} rows", rows, split);
        }

        // ── Step 5: Preview one sampled training batch ────────────────────────
        if prepared.split(Split::Train).is_empty() {
            tracing::warn!("Training split is empty; skipping batch preview");
        } else {
            let mut rng = StdRng::seed_from_u64(cfg.seed);
            let batch   = prepared.sample_batch(&tokenizer, cfg.batch_size, &mut rng)?;
            tracing::info!(
                "Sample train batch: tokens [{}, {}], intents [{}, {}]",
                batch.batch_size,
                batch.seq_len,
                batch.batch_size,
                batch.intent_dim
            );
        }

        // ── Step 6: Save artifacts ────────────────────────────────────────────
        let store = ArtifactStore::new(&cfg.output_dir);
        store.save_config(cfg)?;
        store.save_prepared(&prepared)?;

        let stats = prepared.stats(cfg.batch_size);
        StatsLogger::new(&cfg.output_dir)?.write(&stats)?;

        tracing::info!("Prepared corpus saved to '{}'", cfg.output_dir);
        Ok(stats)
    }
}
