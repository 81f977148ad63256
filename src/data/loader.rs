// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads a word-level corpus and its label vocabularies from a
// directory of JSON files:
//
//   data_dir/
//     data.json          {"train": [...], "valid": [...], "test": [...]}
//     intent_vocab.json  ["inform+price+cheap", ...]
//     tag_vocab.json     ["O", "B-inform+price", ...]
//
// Each example is `[words, tags, intents]` or the named-field
// object form. Missing splits load as empty.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::example::{RawCorpus, Split};
use crate::domain::traits::CorpusSource;

pub const DATA_FILE:         &str = "data.json";
pub const INTENT_VOCAB_FILE: &str = "intent_vocab.json";
pub const TAG_VOCAB_FILE:    &str = "tag_vocab.json";

/// Loads a corpus from JSON files in one directory.
/// Implements the CorpusSource trait from Layer 3.
pub struct JsonCorpusLoader {
    dir: PathBuf,
}

impl JsonCorpusLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CorpusSource for JsonCorpusLoader {
    fn load_corpus(&self) -> Result<RawCorpus> {
        let path = self.dir.join(DATA_FILE);
        let mut corpus: RawCorpus = read_json(&path)?;

        for split in Split::ALL {
            let examples = corpus.entry(split).or_default();
            if examples.is_empty() {
                tracing::warn!("Split '{}' is empty in '{}'", split, path.display());
            }
            for (i, example) in examples.iter().enumerate() {
                example
                    .validate()
                    .with_context(|| format!("{split}[{i}] in '{}'", path.display()))?;
            }
        }

        tracing::info!(
            "Loaded corpus: {} train, {} valid, {} test",
            corpus[&Split::Train].len(),
            corpus[&Split::Valid].len(),
            corpus[&Split::Test].len(),
        );
        Ok(corpus)
    }

    fn load_vocabularies(&self) -> Result<(Vec<String>, Vec<String>)> {
        let intents: Vec<String> = read_json(&self.dir.join(INTENT_VOCAB_FILE))?;
        let tags:    Vec<String> = read_json(&self.dir.join(TAG_VOCAB_FILE))?;
        tracing::debug!("Loaded {} intent labels and {} tag labels", intents.len(), tags.len());
        Ok((intents, tags))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Cannot parse '{}'", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_loads_all_forms_and_fills_missing_splits() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            DATA_FILE,
            r#"{
                "train": [[["hi"], ["O"], ["greet+none+none"]]],
                "val":   [{"words": ["bye"], "tags": ["O"], "intents": []}]
            }"#,
        );
        write(tmp.path(), INTENT_VOCAB_FILE, r#"["greet+none+none"]"#);
        write(tmp.path(), TAG_VOCAB_FILE, r#"["O"]"#);

        let loader = JsonCorpusLoader::new(tmp.path());
        let corpus = loader.load_corpus().unwrap();
        assert_eq!(corpus[&Split::Train].len(), 1);
        assert_eq!(corpus[&Split::Valid][0].words, vec!["bye"]);
        assert!(corpus[&Split::Test].is_empty());

        let (intents, tags) = loader.load_vocabularies().unwrap();
        assert_eq!(intents, vec!["greet+none+none"]);
        assert_eq!(tags, vec!["O"]);
    }

    #[test]
    fn test_length_mismatch_names_location() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), DATA_FILE, r#"{"test": [[["a", "b"], ["O"], []]]}"#);

        let err = JsonCorpusLoader::new(tmp.path()).load_corpus().unwrap_err();
        assert!(format!("{err:#}").contains("test[0]"));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let loader = JsonCorpusLoader::new("/definitely/not/here");
        assert!(loader.load_corpus().is_err());
    }
}
