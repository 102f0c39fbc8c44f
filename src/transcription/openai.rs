//! OpenAI Whisper API transcription.

use super::{source_id, Transcriber, Transcript};
use crate::error::{OmslagError, Result, Stage};
use crate::openai::create_client;
use crate::scratch::require_file;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// Transcriber backed by the hosted Whisper API.
pub struct WhisperApiTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    language: Option<String>,
}

impl WhisperApiTranscriber {
    /// Create a new transcriber with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config("whisper-1", None)
    }

    /// Create a new transcriber with a model and optional language hint.
    pub fn with_config(model: &str, language: Option<&str>) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            language: language.map(|s| s.to_string()),
        })
    }
}

#[async_trait]
impl Transcriber for WhisperApiTranscriber {
    #[instrument(skip(self), fields(path = %path.display(), model = %self.model))]
    async fn transcribe(&self, path: &Path) -> Result<Transcript> {
        require_file(path)?;

        let file_bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => OmslagError::NotFound(path.to_path_buf()),
            _ => OmslagError::Io(e),
        })?;
        debug!("Uploading {} bytes for transcription", file_bytes.len());

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(AudioInput::from_vec_u8(
                path.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("video.mp4")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json);

        if let Some(lang) = &self.language {
            request_builder.language(lang);
        }

        let request = request_builder.build().map_err(|e| {
            OmslagError::inference(Stage::Transcription, format!("Failed to build request: {}", e))
        })?;

        let response = self.client.audio().transcribe(request).await.map_err(|e| {
            OmslagError::inference(Stage::Transcription, format!("Whisper API error: {}", e))
        })?;

        if response.text.trim().is_empty() {
            return Err(OmslagError::inference(
                Stage::Transcription,
                "model returned an empty transcript",
            ));
        }

        debug!("Transcribed {} characters", response.text.len());
        Ok(Transcript::new(response.text, source_id(path)))
    }
}
