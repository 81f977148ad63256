// Shared fixtures for unit tests.

use crate::domain::traits::SubwordTokenizer;
use crate::error::Result;

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Deterministic two-stage tokenizer:
///   - stage one lowercases, drops control/zero-width characters and
///     splits ASCII punctuation into its own token
///   - stage two keeps tokens of up to 6 chars whole, otherwise emits a
///     4-char head followed by `##`-prefixed 3-char pieces
#[derive(Debug, Default, Clone)]
pub struct ToyTokenizer {
    empty_subwords: Option<String>,
    unknown:        Option<String>,
}

impl ToyTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `token` decompose into zero subword units.
    pub fn with_empty_subwords(mut self, token: &str) -> Self {
        self.empty_subwords = Some(token.to_string());
        self
    }

    /// Make `token` missing from the id vocabulary.
    pub fn with_unknown(mut self, token: &str) -> Self {
        self.unknown = Some(token.to_string());
        self
    }
}

impl SubwordTokenizer for ToyTokenizer {
    fn basic_tokenize(&self, text: &str) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for word in text.split_whitespace() {
            let mut current = String::new();
            for c in word.chars() {
                if c.is_control() || c == '\u{200B}' {
                    continue;
                }
                if c.is_ascii_punctuation() {
                    if !current.is_empty() {
                        out.push(std::mem::take(&mut current));
                    }
                    out.push(c.to_string());
                } else {
                    current.extend(c.to_lowercase());
                }
            }
            if !current.is_empty() {
                out.push(current);
            }
        }
        Ok(out)
    }

    fn subword_tokenize(&self, token: &str) -> Result<Vec<String>> {
        if self.empty_subwords.as_deref() == Some(token) {
            return Ok(Vec::new());
        }
        let chars: Vec<char> = token.chars().collect();
        if chars.len() <= 6 {
            return Ok(vec![token.to_string()]);
        }
        let mut pieces = vec![chars[..4].iter().collect::<String>()];
        for chunk in chars[4..].chunks(3) {
            pieces.push(format!("##{}", chunk.iter().collect::<String>()));
        }
        Ok(pieces)
    }

    fn token_to_id(&self, token: &str) -> Option<u32> {
        if self.unknown.as_deref() == Some(token) {
            return None;
        }
        match token {
            "[PAD]" => Some(0),
            "[CLS]" => Some(101),
            "[SEP]" => Some(102),
            _ => {
                // FNV-1a, folded into the non-special id range
                let hash = token
                    .bytes()
                    .fold(0x811c_9dc5_u32, |h, b| (h ^ b as u32).wrapping_mul(0x0100_0193));
                Some(1000 + hash % 20_000)
            }
        }
    }

    fn cls_token(&self) -> &str {
        "[CLS]"
    }

    fn sep_token(&self) -> &str {
        "[SEP]"
    }
}
