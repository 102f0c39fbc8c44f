//! Transcribe command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcription::{create_transcriber, normalize_text};
use anyhow::Result;
use std::path::Path;

/// Run the transcribe command.
pub async fn run_transcribe(
    input: &str,
    normalize: bool,
    output: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Transcribe, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'omslag doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let device = settings.general.device.resolve();
    let transcriber = create_transcriber(&settings.transcription, device)?;

    let spinner = Output::spinner(&format!("Transcribing {}...", input));
    let result = transcriber.transcribe(Path::new(input)).await;
    spinner.finish_and_clear();
    let transcript = result?;

    let text = if normalize {
        normalize_text(&transcript.text)
    } else {
        transcript.text
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &text)?;
            Output::success(&format!(
                "Transcript ({} characters) written to {}",
                text.chars().count(),
                path
            ));
        }
        None => println!("{}", text),
    }

    Ok(())
}
