// ============================================================
// BIO Span Policies
// ============================================================
// Group word-level BIO tags into (intent, slot, value) spans.
//
//   words: find  a  cheap           chinese         restaurant
//   tags:  O     O  B-inform+price  I-inform+price  O
//   span:  ("inform", "price", "cheap chinese")
//
// A span opens on a `B-` tag and extends through the directly
// following `I-` tags with the identical `intent+slot` suffix.
// The policies only differ in how an `I-` tag that continues
// nothing (an orphan) is handled:
//
//   LenientBio → orphan is dropped silently
//   StrictBio  → orphan is a MalformedSpan error

use crate::domain::prediction::SlotTriple;
use crate::error::{Error, Result};

pub trait SpanPolicy: Send + Sync {
    /// Called for every `I-` tag that is not part of an open span.
    fn on_orphan_inside(&self, word_index: usize, tag: &str) -> Result<()>;

    /// Scan one tag per word (`None` = no surviving tag, read as `O`).
    fn group_spans(&self, tags: &[Option<&str>], words: &[String]) -> Result<Vec<SlotTriple>> {
        let mut spans = Vec::new();
        let mut i     = 0;

        while i < tags.len() {
            let Some(tag) = tags[i] else {
                i += 1;
                continue;
            };

            if tag.starts_with('B') {
                let label         = span_label(tag);
                let (intent, slot) = split_span_label(tag, label)?;
                let mut value      = words[i].clone();
                let mut j          = i + 1;

                while let Some(Some(next)) = tags.get(j) {
                    if next.starts_with('I') && span_label(next) == label {
                        value.push(' ');
                        value.push_str(&words[j]);
                        j += 1;
                    } else {
                        break;
                    }
                }

                spans.push(SlotTriple::new(intent, slot, value));
                i = j;
                continue;
            }

            if tag.starts_with('I') {
                self.on_orphan_inside(i, tag)?;
            }
            i += 1;
        }

        Ok(spans)
    }
}

/// Drops orphan `I-` tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientBio;

impl SpanPolicy for LenientBio {
    fn on_orphan_inside(&self, word_index: usize, tag: &str) -> Result<()> {
        tracing::trace!("dropping orphan tag '{}' at word {}", tag, word_index);
        Ok(())
    }
}

/// Rejects orphan `I-` tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictBio;

impl SpanPolicy for StrictBio {
    fn on_orphan_inside(&self, word_index: usize, tag: &str) -> Result<()> {
        Err(Error::MalformedSpan(format!(
            "'{tag}' at word {word_index} does not continue an open span"
        )))
    }
}

/// Text after the `B-`/`I-` marker.
fn span_label(tag: &str) -> &str {
    tag.get(2..).unwrap_or("")
}

fn split_span_label<'t>(tag: &str, label: &'t str) -> Result<(&'t str, &'t str)> {
    let mut parts = label.split('+');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(intent), Some(slot), None) => Ok((intent, slot)),
        _ => Err(Error::MalformedLabel(tag.to_string())),
    }
}
