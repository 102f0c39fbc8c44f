//! Generate command implementation.

use crate::cli::output::format_bytes;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, StylePreferences};
use anyhow::{Context, Result};
use std::path::Path;

/// Run the generate command.
pub async fn run_generate(
    video: &str,
    style: &str,
    color: &str,
    output: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Generate, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'omslag doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let video_path = Path::new(video);
    let bytes = tokio::fs::read(video_path)
        .await
        .with_context(|| format!("Failed to read {}", video_path.display()))?;
    let filename = video_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Output::info(&format!("Processing: {} ({})", video, format_bytes(bytes.len() as u64)));

    let orchestrator = Orchestrator::new(settings)?;
    let preferences = StylePreferences::new(style, color);

    let spinner = Output::spinner("Transcribing, summarizing and rendering...");
    let result = orchestrator.process(&bytes, &filename, &preferences).await;
    spinner.finish_and_clear();

    let cover = match result {
        Ok(cover) => cover,
        Err(e) => {
            Output::error(&format!("Failed at the {} stage: {}", e.stage, e.source));
            return Err(e.into());
        }
    };

    Output::success(&format!("Cover written to {}", cover.path.display()));
    Output::kv("Request", &cover.request_id.to_string());
    Output::kv("Type", cover.content_type);
    Output::kv("Size", &format_bytes(cover.bytes.len() as u64));

    if let Some(output_path) = output {
        if let Some(parent) = Path::new(&output_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&output_path, &cover.bytes)
            .with_context(|| format!("Failed to write {}", output_path))?;
        Output::success(&format!("Copied to {}", output_path));
    }

    Ok(())
}
