//! Summarize command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::summarization::create_summarizer;
use anyhow::Result;
use std::path::Path;

/// Run the summarize command.
pub async fn run_summarize(input: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Summarize, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'omslag doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let summarizer = create_summarizer(&settings.summarization, &prompts)?;

    let spinner = Output::spinner("Summarizing...");
    let result = summarizer.summarize(Path::new(input)).await;
    spinner.finish_and_clear();
    let summary = result?;

    Output::header("Summary");
    Output::summary(&summary, 80);

    Ok(())
}
