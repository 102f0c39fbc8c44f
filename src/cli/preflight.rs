//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::{Settings, TranscriptionProvider};
use crate::error::{OmslagError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Cover generation and serving need every stage.
    Generate,
    /// Transcription alone.
    Transcribe,
    /// Summarization only needs the chat API.
    Summarize,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    let local_whisper = settings.transcription.provider == TranscriptionProvider::Local;

    match operation {
        Operation::Generate => {
            check_api_key()?;
            if local_whisper {
                check_tool(&settings.transcription.local_command)?;
            }
        }
        Operation::Transcribe => {
            if local_whisper {
                check_tool(&settings.transcription.local_command)?;
            } else {
                check_api_key()?;
            }
        }
        Operation::Summarize => {
            check_api_key()?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(OmslagError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(OmslagError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--help").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(OmslagError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(OmslagError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(OmslagError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_local_tool() {
        let mut settings = Settings::default();
        settings.transcription.provider = TranscriptionProvider::Local;
        settings.transcription.local_command = "omslag-no-such-whisper".to_string();

        let err = check(Operation::Transcribe, &settings).unwrap_err();
        assert!(matches!(err, OmslagError::ToolNotFound(name) if name == "omslag-no-such-whisper"));
    }
}
