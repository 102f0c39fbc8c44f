//! Summarization stage for Omslag.
//!
//! Reads a transcript from disk, prefixes the steering preamble and condenses
//! the result into a short, visually descriptive summary.
//!
//! The summarizer only ever sees a fixed-size window of input: preamble, one
//! space and transcript are joined and then cut to `max_input_chars`
//! characters. On long videos the tail of the transcript never reaches the
//! model. [`SummaryWindow`] owns that rule.

mod openai;

pub use openai::OpenAiSummarizer;

use crate::config::{Prompts, SummarizationSettings};
use crate::error::{OmslagError, Result};
use crate::scratch::require_file;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Trait for summarization services.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize the text stored at `text_source`.
    ///
    /// Fails with `NotFound` when the file is missing and with
    /// `InferenceFailure` when the model call fails.
    async fn summarize(&self, text_source: &Path) -> Result<String>;
}

/// Build the configured summarization backend.
pub fn create_summarizer(
    settings: &SummarizationSettings,
    prompts: &Prompts,
) -> Result<Arc<dyn Summarizer>> {
    Ok(Arc::new(OpenAiSummarizer::with_config(settings, prompts)?))
}

/// Model input after the preamble was applied and the budget enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryInput {
    pub text: String,
    /// Characters cut from the end to stay within budget.
    pub dropped_chars: usize,
}

impl SummaryInput {
    pub fn is_truncated(&self) -> bool {
        self.dropped_chars > 0
    }
}

/// Steering preamble plus the character budget for summarizer input.
#[derive(Debug, Clone)]
pub struct SummaryWindow {
    preamble: String,
    max_input_chars: usize,
}

impl SummaryWindow {
    pub fn new(preamble: impl Into<String>, max_input_chars: usize) -> Self {
        Self {
            preamble: preamble.into(),
            max_input_chars,
        }
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    /// Join preamble and transcript, then cut to the budget.
    ///
    /// Length is counted in `char`s, never splitting a code point.
    pub fn build(&self, transcript: &str) -> SummaryInput {
        let full = format!("{} {}", self.preamble, transcript);
        let total = full.chars().count();

        if total <= self.max_input_chars {
            return SummaryInput {
                text: full,
                dropped_chars: 0,
            };
        }

        SummaryInput {
            text: full.chars().take(self.max_input_chars).collect(),
            dropped_chars: total - self.max_input_chars,
        }
    }

    /// Read the transcript at `path` and build the model input from it.
    pub async fn load(&self, path: &Path) -> Result<SummaryInput> {
        require_file(path)?;

        let transcript = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => OmslagError::NotFound(path.to_path_buf()),
            _ => OmslagError::Io(e),
        })?;

        let input = self.build(&transcript);
        if input.is_truncated() {
            warn!(
                "Summarizer input exceeds {} characters, dropping the last {}",
                self.max_input_chars, input.dropped_chars
            );
        }
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const PREAMBLE: &str = "Describe this visually.";

    #[test]
    fn test_short_transcript_untouched() {
        let window = SummaryWindow::new(PREAMBLE, 1024);
        let input = window.build("A cat sits on a mat.");

        assert_eq!(input.text, "Describe this visually. A cat sits on a mat.");
        assert!(!input.is_truncated());
    }

    #[test]
    fn test_budget_counts_preamble() {
        let window = SummaryWindow::new(PREAMBLE, 1024);
        let transcript = "word ".repeat(1000);
        let input = window.build(&transcript);

        assert_eq!(input.text.chars().count(), 1024);
        assert!(input.text.starts_with(PREAMBLE));
        assert_eq!(
            input.dropped_chars,
            PREAMBLE.chars().count() + 1 + transcript.chars().count() - 1024
        );
    }

    #[test]
    fn test_budget_holds_for_any_length() {
        let window = SummaryWindow::new(PREAMBLE, 1024);
        for len in [0, 1, 999, 1000, 1001, 5000, 100_000] {
            let transcript = "x".repeat(len);
            assert!(window.build(&transcript).text.chars().count() <= 1024, "len {}", len);
        }
    }

    #[test]
    fn test_budget_never_splits_code_points() {
        let window = SummaryWindow::new("ż", 10);
        let input = window.build(&"ółw".repeat(10));

        assert_eq!(input.text.chars().count(), 10);
        assert_eq!(input.text, "ż ółwółwół");
    }

    #[test]
    fn test_preamble_longer_than_budget() {
        let window = SummaryWindow::new("abcdefghij", 4);
        let input = window.build("transcript");
        assert_eq!(input.text, "abcd");
    }

    #[tokio::test]
    async fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        std::fs::write(&path, "A talk about sailing.").unwrap();

        let window = SummaryWindow::new(PREAMBLE, 1024);
        let input = window.load(&path).await.unwrap();
        assert_eq!(input.text, "Describe this visually. A talk about sailing.");
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let window = SummaryWindow::new(PREAMBLE, 1024);

        let err = window.load(&dir.path().join("gone.txt")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
