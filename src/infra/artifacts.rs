// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Saves and restores the output of `prepare` as JSON.
//
// What gets saved per run:
//   1. prepared.json        — vocabularies, aligned splits and
//                             intent class weights
//   2. prepare_config.json  — the config the run used, so
//                             `decode` can find the tokenizer
//                             and default threshold again
//
// File layout:
//   output_dir/
//     prepared.json
//     prepare_config.json
//     split_stats.csv       ← written by the metrics logger

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::application::prepare_use_case::PrepareConfig;
use crate::data::prepared::PreparedCorpus;

pub const PREPARED_FILE: &str = "prepared.json";
pub const CONFIG_FILE:   &str = "prepare_config.json";

/// Reads and writes prepare artifacts in one directory.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_prepared(&self, corpus: &PreparedCorpus) -> Result<()> {
        self.write_json(PREPARED_FILE, corpus)
    }

    pub fn load_prepared(&self) -> Result<PreparedCorpus> {
        self.read_json(PREPARED_FILE, "Have you run 'prepare' first?")
    }

    pub fn save_config(&self, cfg: &PrepareConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)
    }

    pub fn load_config(&self) -> Result<PrepareConfig> {
        self.read_json(CONFIG_FILE, "Have you run 'prepare' first?")
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str, hint: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'. {hint}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse '{}'", path.display()))
    }
}
