// ============================================================
// Error Types
// ============================================================
// Every failure the data-preparation layer can surface.
// All of them are fatal for the call that produced them:
// nothing is retried and no partial batch is returned.
//
// The application and CLI layers wrap these in anyhow with
// extra context; library code returns `nlu::Result`.

use thiserror::Error;

/// Result type for alignment, batching and recovery operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A label or id outside the fixed vocabulary.
    #[error("unknown {kind}: {value}")]
    UnknownLabel { kind: &'static str, value: String },

    /// First-stage tokens could not be reconciled with the original words,
    /// or a token decomposed into zero subword units.
    #[error("alignment failed: {0}")]
    Alignment(String),

    /// A label never (or always) occurs in the training split,
    /// so its class weight is undefined.
    #[error("degenerate intent '{intent}': {positives} positives out of {total} training examples")]
    DegenerateVocabulary {
        intent:    String,
        positives: usize,
        total:     usize,
    },

    /// An example disagrees with the vocabulary dimensions at padding time.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A subword token has no id in the tokenizer vocabulary.
    #[error("token '{0}' is not in the tokenizer vocabulary")]
    UnknownToken(String),

    /// A label string that does not follow the `intent+slot(+value)` layout.
    #[error("malformed label '{0}'")]
    MalformedLabel(String),

    /// Rejected by the strict BIO span policy.
    #[error("malformed span: {0}")]
    MalformedSpan(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn unknown_intent(value: impl ToString) -> Self {
        Error::UnknownLabel { kind: "intent", value: value.to_string() }
    }

    pub fn unknown_tag(value: impl ToString) -> Self {
        Error::UnknownLabel { kind: "tag", value: value.to_string() }
    }

    pub fn alignment(msg: impl Into<String>) -> Self {
        Error::Alignment(msg.into())
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        Error::ShapeMismatch(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    pub fn tokenizer(msg: impl ToString) -> Self {
        Error::Tokenizer(msg.to_string())
    }
}
