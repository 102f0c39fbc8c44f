//! Data models for transcription.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Plain text produced by the transcription stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Transcribed text, exactly as the model returned it.
    pub text: String,
    /// Identifier of the source media, usually the file stem.
    pub source_id: Option<String>,
}

impl Transcript {
    /// Create a new transcript.
    pub fn new(text: String, source_id: Option<String>) -> Self {
        Self { text, source_id }
    }

    /// Number of characters in the transcript.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s]").expect("punctuation pattern is valid")
});

/// Normalize text for comparison: lowercase, punctuation removed, trimmed.
///
/// The pipeline never applies this to transcripts; it exists for callers
/// that compare transcripts against reference text.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    PUNCTUATION.replace_all(&lowered, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_creation() {
        let transcript = Transcript::new(" Hello, world. ".to_string(), Some("clip".to_string()));
        assert_eq!(transcript.text, " Hello, world. ");
        assert_eq!(transcript.source_id.as_deref(), Some("clip"));
        assert_eq!(transcript.char_count(), 15);
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Hello, World!  "), "hello world");
        assert_eq!(normalize_text("It's 3 o'clock."), "its 3 oclock");
        assert_eq!(normalize_text("snake_case stays"), "snake_case stays");
        assert_eq!(normalize_text("Zażółć gęślą!"), "zażółć gęślą");
    }
}
