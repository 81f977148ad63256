// ============================================================
// Layer 4 — Class-Weight Estimator
// ============================================================
// Per-intent positive-class weights for multi-label training.
//
//   weight[i] = ln( (train_size - positives[i]) / positives[i] )
//
// i.e. the log negative-to-positive ratio, used as a logit
// bias / pos_weight for imbalanced binary cross-entropy.
//
// Example: 100 training examples, 25 carry intent i
//   weight[i] = ln(75 / 25) = ln(3) ≈ 1.0986
//
// Computed once from the TRAIN split only and never mutated.

use serde::{Deserialize, Serialize};

use crate::data::vocab::LabelVocab;
use crate::domain::example::AlignedExample;
use crate::error::{Error, Result};

/// What to do when an intent has no positives (or no negatives).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DegeneratePolicy {
    /// Fail with `DegenerateVocabulary`.
    #[default]
    Fail,
    /// Replace a zero count with this value before taking the ratio.
    Floor(f64),
}

impl From<Option<f64>> for DegeneratePolicy {
    fn from(floor: Option<f64>) -> Self {
        floor.map_or(DegeneratePolicy::Fail, DegeneratePolicy::Floor)
    }
}

/// One weight per intent id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    weights: Vec<f64>,
}

impl ClassWeights {
    /// Count positives per intent over the training split and take the log ratio.
    pub fn estimate(
        train:  &[AlignedExample],
        vocab:  &LabelVocab,
        policy: DegeneratePolicy,
    ) -> Result<Self> {
        let mut positives = vec![0usize; vocab.intent_dim()];
        for example in train {
            // intent_ids is a set, so repeated intents count once
            for &id in &example.intent_ids {
                let slot = positives.get_mut(id).ok_or_else(|| Error::unknown_intent(id))?;
                *slot += 1;
            }
        }

        let total   = train.len();
        let weights = positives
            .iter()
            .enumerate()
            .map(|(id, &pos)| weight_for(id, pos, total, vocab, policy))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Estimated {} intent weights from {} training examples", weights.len(), total);
        Ok(Self { weights })
    }

    pub fn get(&self, intent_id: usize) -> Option<f64> {
        self.weights.get(intent_id).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

fn weight_for(
    id:     usize,
    pos:    usize,
    total:  usize,
    vocab:  &LabelVocab,
    policy: DegeneratePolicy,
) -> Result<f64> {
    let neg = total - pos;
    match policy {
        DegeneratePolicy::Fail if pos == 0 || neg == 0 => Err(Error::DegenerateVocabulary {
            intent:    vocab.id_to_intent(id)?.to_string(),
            positives: pos,
            total,
        }),
        DegeneratePolicy::Fail => Ok((neg as f64 / pos as f64).ln()),
        DegeneratePolicy::Floor(floor) => {
            let pos = if pos == 0 { floor } else { pos as f64 };
            let neg = if neg == 0 { floor } else { neg as f64 };
            Ok((neg / pos).ln())
        }
    }
}
