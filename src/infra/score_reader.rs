// ============================================================
// Layer 6 — Score Reader
// ============================================================
// Reads the model scores handed to `decode`: a JSON array of
// score batches, one per exhaustive batch of the split, in order.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::recovery::ScoreBatch;

pub fn read_score_batches(path: impl AsRef<Path>) -> Result<Vec<ScoreBatch>> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read outputs from '{}'", path.display()))?;
    let batches: Vec<ScoreBatch> = serde_json::from_str(&json)
        .with_context(|| format!("Cannot parse outputs in '{}'", path.display()))?;
    tracing::debug!("Read {} score batches from '{}'", batches.len(), path.display());
    Ok(batches)
}
