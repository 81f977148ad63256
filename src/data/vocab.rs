// ============================================================
// Layer 4 — Label Vocabulary
// ============================================================
// Bidirectional id <-> label maps for intents and BIO tags.
//
//   id → label : a plain Vec indexed by id (dense ids 0..N)
//   label → id : a HashMap built once from the same Vec
//
// Both maps are built in `new` and never mutated again; the
// fields are private so the only way to read them is through
// the lookup methods. Share it behind an Arc across threads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One direction-pair of label maps.
#[derive(Debug, Clone, PartialEq)]
struct LabelMap {
    id2label: Vec<String>,
    label2id: HashMap<String, usize>,
}

impl LabelMap {
    fn new(kind: &str, labels: Vec<String>) -> Result<Self> {
        let mut label2id = HashMap::with_capacity(labels.len());
        for (id, label) in labels.iter().enumerate() {
            if label2id.insert(label.clone(), id).is_some() {
                return Err(Error::invalid_config(format!(
                    "duplicate {kind} label '{label}' in vocabulary"
                )));
            }
        }
        Ok(Self { id2label: labels, label2id })
    }
}

/// Immutable intent and tag vocabularies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VocabRecord", into = "VocabRecord")]
pub struct LabelVocab {
    intents: LabelMap,
    tags:    LabelMap,
}

/// On-disk form: just the two ordered label lists.
#[derive(Serialize, Deserialize)]
struct VocabRecord {
    intent_vocab: Vec<String>,
    tag_vocab:    Vec<String>,
}

impl TryFrom<VocabRecord> for LabelVocab {
    type Error = Error;

    fn try_from(r: VocabRecord) -> Result<Self> {
        Self::new(r.intent_vocab, r.tag_vocab)
    }
}

impl From<LabelVocab> for VocabRecord {
    fn from(v: LabelVocab) -> Self {
        Self {
            intent_vocab: v.intents.id2label,
            tag_vocab:    v.tags.id2label,
        }
    }
}

impl LabelVocab {
    /// Build both vocabularies. Labels must be distinct within each list.
    pub fn new(intent_vocab: Vec<String>, tag_vocab: Vec<String>) -> Result<Self> {
        Ok(Self {
            intents: LabelMap::new("intent", intent_vocab)?,
            tags:    LabelMap::new("tag", tag_vocab)?,
        })
    }

    pub fn intent_dim(&self) -> usize {
        self.intents.id2label.len()
    }

    pub fn tag_dim(&self) -> usize {
        self.tags.id2label.len()
    }

    pub fn intent_labels(&self) -> &[String] {
        &self.intents.id2label
    }

    pub fn tag_labels(&self) -> &[String] {
        &self.tags.id2label
    }

    pub fn intent_to_id(&self, intent: &str) -> Result<usize> {
        self.intents
            .label2id
            .get(intent)
            .copied()
            .ok_or_else(|| Error::unknown_intent(intent))
    }

    pub fn id_to_intent(&self, id: usize) -> Result<&str> {
        self.intents
            .id2label
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| Error::unknown_intent(id))
    }

    pub fn tag_to_id(&self, tag: &str) -> Result<usize> {
        self.tags
            .label2id
            .get(tag)
            .copied()
            .ok_or_else(|| Error::unknown_tag(tag))
    }

    pub fn id_to_tag(&self, id: usize) -> Result<&str> {
        self.tags
            .id2label
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| Error::unknown_tag(id))
    }

    pub fn tag_ids<S: AsRef<str>>(&self, tags: &[S]) -> Result<Vec<usize>> {
        tags.iter().map(|t| self.tag_to_id(t.as_ref())).collect()
    }

    pub fn tags_of(&self, ids: &[usize]) -> Result<Vec<&str>> {
        ids.iter().map(|&id| self.id_to_tag(id)).collect()
    }

    pub fn intent_ids<S: AsRef<str>>(&self, intents: &[S]) -> Result<Vec<usize>> {
        intents.iter().map(|i| self.intent_to_id(i.as_ref())).collect()
    }

    pub fn intents_of(&self, ids: &[usize]) -> Result<Vec<&str>> {
        ids.iter().map(|&id| self.id_to_intent(id)).collect()
    }
}
