// ============================================================
// Layer 6 — Split Statistics Logger
// ============================================================
// Records one row per aligned split to a CSV file after
// `prepare`.
//
// Columns:
//   - split:          train / valid / test
//   - examples:       number of examples
//   - subword_tokens: total subword tokens (no boundary markers)
//   - longest:        longest aligned example in subwords
//   - batches:        exhaustive batch count at the run's batch size
//
// Output file: output_dir/split_stats.csv
//
// Example CSV output:
//   split,examples,subword_tokens,longest,batches
//   train,8420,91233,47,264
//   valid,1000,10877,41,32

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::data::prepared::SplitStats;

pub const STATS_FILE: &str = "split_stats.csv";
const HEADER: &str = "split,examples,subword_tokens,longest,batches";

/// Writes split statistics as CSV.
pub struct StatsLogger {
    csv_path: PathBuf,
}

impl StatsLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        Ok(Self { csv_path: dir.join(STATS_FILE) })
    }

    /// Replace the CSV with one header row and one row per split.
    pub fn write(&self, stats: &[SplitStats]) -> Result<()> {
        let file = File::create(&self.csv_path)
            .with_context(|| format!("Cannot create '{}'", self.csv_path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "{HEADER}")?;
        for s in stats {
            writeln!(
                w,
                "{},{},{},{},{}",
                s.split, s.examples, s.subword_tokens, s.longest, s.batches
            )?;
            tracing::debug!(
                "{}: {} examples, {} subword tokens, longest {}, {} batches",
                s.split,
                s.examples,
                s.subword_tokens,
                s.longest,
                s.batches
            );
        }
        w.flush()?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
