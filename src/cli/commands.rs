// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `prepare` and `decode`
// and all their configurable flags.

use clap::{Args, Subcommand};

use crate::application::{decode_use_case::DecodeConfig, prepare_use_case::PrepareConfig};
use crate::domain::example::Split;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Align a word-level corpus to subwords and save the prepared splits
    Prepare(PrepareArgs),

    /// Recover (intent, slot, value) triples from saved model scores
    Decode(DecodeArgs),
}

/// All arguments for the `prepare` command.
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Directory with data.json, intent_vocab.json and tag_vocab.json
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// WordPiece tokenizer.json, or a BERT vocab.txt (one piece per line)
    #[arg(long, default_value = "data/tokenizer.json")]
    pub tokenizer: String,

    /// Where prepared.json, prepare_config.json and split_stats.csv go
    #[arg(long, default_value = "prepared")]
    pub output_dir: String,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Intent score threshold saved for later decoding (strict >)
    #[arg(long, default_value_t = 0.5)]
    pub intent_threshold: f32,

    /// Replace zero label counts with this value instead of failing
    #[arg(long)]
    pub weight_floor: Option<f64>,

    /// Seed for the sampled preview batch
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI PrepareArgs into the application-layer PrepareConfig.
/// The application layer never sees clap types.
impl From<PrepareArgs> for PrepareConfig {
    fn from(a: PrepareArgs) -> Self {
        PrepareConfig {
            data_dir:         a.data_dir,
            tokenizer_path:   a.tokenizer,
            output_dir:       a.output_dir,
            batch_size:       a.batch_size,
            intent_threshold: a.intent_threshold,
            weight_floor:     a.weight_floor,
            seed:             a.seed,
        }
    }
}

/// All arguments for the `decode` command
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// JSON file of score batches, in exhaustive batch order
    #[arg(long)]
    pub outputs: String,

    /// Directory written by `prepare`
    #[arg(long, default_value = "prepared")]
    pub prepared_dir: String,

    /// Which split the scores belong to
    #[arg(long, default_value = "test")]
    pub split: Split,

    /// Overrides the threshold saved by `prepare`
    #[arg(long)]
    pub intent_threshold: Option<f32>,

    /// Fail on I- tags that do not continue an open span
    #[arg(long)]
    pub strict_bio: bool,
}

impl From<DecodeArgs> for DecodeConfig {
    fn from(a: DecodeArgs) -> Self {
        DecodeConfig {
            prepared_dir:     a.prepared_dir,
            outputs_path:     a.outputs,
            split:            a.split,
            intent_threshold: a.intent_threshold,
            strict_bio:       a.strict_bio,
        }
    }
}
