// ============================================================
// Layer 3 — Prediction Domain Type
// ============================================================
// One recovered dialogue-act fragment:
//
//   ("inform", "price", "cheap chinese")
//
// Intent labels in the vocabulary encode all three parts in
// one string separated by `+` or `*`, e.g. `request+area*?`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotTriple {
    pub intent: String,
    pub slot:   String,
    pub value:  String,
}

impl SlotTriple {
    pub fn new(
        intent: impl Into<String>,
        slot:   impl Into<String>,
        value:  impl Into<String>,
    ) -> Self {
        Self {
            intent: intent.into(),
            slot:   slot.into(),
            value:  value.into(),
        }
    }

    /// Split a multi-label intent string on `+`/`*` into exactly three parts.
    pub fn parse_intent_label(label: &str) -> Result<Self> {
        let parts: Vec<&str> = label.split(['+', '*']).collect();
        match parts.as_slice() {
            [intent, slot, value] => Ok(Self::new(*intent, *slot, *value)),
            _ => Err(Error::MalformedLabel(label.to_string())),
        }
    }
}

impl fmt::Display for SlotTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.intent, self.slot, self.value)
    }
}
