//! Transcription stage for Omslag.
//!
//! Turns a video or audio file into plain text.
//!
//! # Backends
//!
//! - **OpenAI** (default): uploads the file to the hosted Whisper API.
//! - **Local**: runs the `whisper` command line tool on this machine, on the
//!   device resolved at startup.

mod local;
mod models;
mod openai;

pub use local::LocalWhisperTranscriber;
pub use models::{normalize_text, Transcript};
pub use openai::WhisperApiTranscriber;

use crate::config::{ResolvedDevice, TranscriptionProvider, TranscriptionSettings};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a media file into text.
    ///
    /// Fails with `NotFound` when `path` is not an existing regular file and
    /// with `InferenceFailure` when the model cannot produce text.
    async fn transcribe(&self, path: &Path) -> Result<Transcript>;
}

/// Build the configured transcription backend.
pub fn create_transcriber(
    settings: &TranscriptionSettings,
    device: ResolvedDevice,
) -> Result<Arc<dyn Transcriber>> {
    let transcriber: Arc<dyn Transcriber> = match settings.provider {
        TranscriptionProvider::OpenAI => Arc::new(WhisperApiTranscriber::with_config(
            &settings.model,
            settings.language.as_deref(),
        )?),
        TranscriptionProvider::Local => Arc::new(LocalWhisperTranscriber::with_config(
            &settings.local_command,
            &settings.local_model,
            device,
            settings.language.as_deref(),
        )),
    };
    Ok(transcriber)
}

/// Identifier derived from a media path (its file stem).
pub(crate) fn source_id(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
