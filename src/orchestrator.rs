//! Pipeline orchestrator for Omslag.
//!
//! Runs one request through upload storage, transcription, summarization and
//! image generation, strictly in that order:
//!
//! `Received → VideoStored → Transcribed → Summarized → ImageGenerated → Completed`
//!
//! Any failure moves the request to `Failed(stage)` and short-circuits the rest.
//! The uploaded video and the intermediate transcript are held by
//! [`ScratchFile`] guards, so they are gone once `process` returns no matter
//! how it returns. Only the generated image outlives the request.
//!
//! Each model-backed stage sits behind its own semaphore. A stage configured
//! with `max_concurrent = 1` serializes all requests through its model;
//! larger values let requests share the model concurrently.

use crate::config::{Prompts, Settings};
use crate::error::{OmslagError, PipelineError, Result, Stage};
use crate::imaging::{
    create_image_generator, detect_content_type, extension_for, into_generation_failure,
    ImageGenerator,
};
use crate::scratch::{ScratchFile, ScratchPaths};
use crate::summarization::{create_summarizer, Summarizer};
use crate::transcription::{create_transcriber, Transcriber};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Caller-supplied look of the cover. Free-form and unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylePreferences {
    pub style: String,
    pub color: String,
}

impl StylePreferences {
    pub fn new(style: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            color: color.into(),
        }
    }
}

/// Combine a summary with style preferences into the image prompt.
///
/// Style and color are inserted verbatim, empty strings included.
pub fn build_prompt(summary: &str, preferences: &StylePreferences) -> String {
    format!(
        "{} in Style: {}, in Color: {}.",
        summary, preferences.style, preferences.color
    )
}

/// Where a request currently is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    VideoStored,
    Transcribed,
    Summarized,
    ImageGenerated,
    Completed,
    Failed(Stage),
}

/// Final artifact of a successful request.
#[derive(Debug, Clone)]
pub struct CoverImage {
    pub request_id: Uuid,
    /// Location of the image on disk; retention is up to the caller.
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Per-stage concurrency limits.
struct StageGates {
    transcription: Semaphore,
    summarization: Semaphore,
    image_generation: Semaphore,
}

impl StageGates {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            transcription: Semaphore::new(settings.transcription.max_concurrent.max(1)),
            summarization: Semaphore::new(settings.summarization.max_concurrent.max(1)),
            image_generation: Semaphore::new(settings.image.max_concurrent.max(1)),
        }
    }

    fn for_stage(&self, stage: Stage) -> Option<&Semaphore> {
        match stage {
            Stage::Upload => None,
            Stage::Transcription => Some(&self.transcription),
            Stage::Summarization => Some(&self.summarization),
            Stage::ImageGeneration => Some(&self.image_generation),
        }
    }
}

/// The main orchestrator for the Omslag pipeline.
pub struct Orchestrator {
    settings: Settings,
    transcriber: Arc<dyn Transcriber>,
    summarizer: Arc<dyn Summarizer>,
    generator: Arc<dyn ImageGenerator>,
    gates: StageGates,
    temp_dir: PathBuf,
    output_dir: PathBuf,
    stage_timeout: Duration,
}

impl Orchestrator {
    /// Create an orchestrator with the configured model backends.
    ///
    /// The compute device is resolved here, once, and handed to the stages.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let device = settings.general.device.resolve();
        info!(
            "Transcription: {} ({}), device {}",
            settings.transcription.provider, settings.transcription.model, device
        );
        info!("Summarization: {}", settings.summarization.model);
        info!("Image generation: {} ({})", settings.image.model, settings.image.size);

        let transcriber = create_transcriber(&settings.transcription, device)?;
        let summarizer = create_summarizer(&settings.summarization, &prompts)?;
        let generator = create_image_generator(&settings.image)?;

        Self::with_components(settings, transcriber, summarizer, generator)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        transcriber: Arc<dyn Transcriber>,
        summarizer: Arc<dyn Summarizer>,
        generator: Arc<dyn ImageGenerator>,
    ) -> Result<Self> {
        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        Ok(Self {
            gates: StageGates::from_settings(&settings),
            output_dir: settings.output_dir(),
            stage_timeout: settings.pipeline.stage_timeout(),
            temp_dir,
            settings,
            transcriber,
            summarizer,
            generator,
        })
    }

    /// Override the per-stage timeout.
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Where a request's cover will be written.
    ///
    /// Without `image.file_name` the `.png` extension is provisional and is
    /// corrected once the image format is known.
    pub fn output_path(&self, request_id: Uuid) -> PathBuf {
        match &self.settings.image.file_name {
            Some(name) => self.output_dir.join(name),
            None => self.output_dir.join(format!("{}.png", request_id)),
        }
    }

    /// Turn an uploaded video into a cover image.
    ///
    /// Returns the image or an error naming the single stage that failed.
    #[instrument(skip(self, video, preferences), fields(filename = %filename, bytes = video.len()))]
    pub async fn process(
        &self,
        video: &[u8],
        filename: &str,
        preferences: &StylePreferences,
    ) -> std::result::Result<CoverImage, PipelineError> {
        let request_id = Uuid::new_v4();
        self.transition(request_id, PipelineState::Received);

        let result = self.run_cover(request_id, video, filename, preferences).await;
        self.finish(request_id, &result);
        result
    }

    /// Transcribe and summarize an uploaded video without generating an image.
    #[instrument(skip(self, video), fields(filename = %filename, bytes = video.len()))]
    pub async fn summarize_video(
        &self,
        video: &[u8],
        filename: &str,
    ) -> std::result::Result<String, PipelineError> {
        let request_id = Uuid::new_v4();
        self.transition(request_id, PipelineState::Received);

        let result = self.run_summary(request_id, video, filename).await;
        self.finish(request_id, &result);
        result
    }

    async fn run_cover(
        &self,
        request_id: Uuid,
        video: &[u8],
        filename: &str,
        preferences: &StylePreferences,
    ) -> std::result::Result<CoverImage, PipelineError> {
        let summary = self.run_summary(request_id, video, filename).await?;

        let prompt = build_prompt(&summary, preferences);
        debug!("Image prompt: {}", prompt);

        let output_path = self.output_path(request_id);
        let image_path = self
            .run_stage(
                Stage::ImageGeneration,
                self.generator.generate_image(&prompt, &output_path),
            )
            .await?;

        let bytes = tokio::fs::read(&image_path).await.map_err(|e| {
            PipelineError::new(Stage::ImageGeneration, OmslagError::generation(e))
        })?;
        let content_type = detect_content_type(&bytes).ok_or_else(|| {
            PipelineError::new(
                Stage::ImageGeneration,
                OmslagError::generation(format!(
                    "{} is not a PNG, JPEG or WebP image",
                    image_path.display()
                )),
            )
        })?;
        let image_path = self
            .match_extension(image_path, content_type)
            .await
            .map_err(|e| PipelineError::new(Stage::ImageGeneration, OmslagError::generation(e)))?;
        self.transition(request_id, PipelineState::ImageGenerated);

        Ok(CoverImage {
            request_id,
            path: image_path,
            bytes,
            content_type,
        })
    }

    /// Rename a default-named cover so its extension matches its format.
    async fn match_extension(
        &self,
        image_path: PathBuf,
        content_type: &str,
    ) -> std::io::Result<PathBuf> {
        if self.settings.image.file_name.is_some() {
            return Ok(image_path);
        }

        let renamed = image_path.with_extension(extension_for(content_type));
        if renamed != image_path {
            tokio::fs::rename(&image_path, &renamed).await?;
            debug!("Renamed cover to {}", renamed.display());
        }
        Ok(renamed)
    }

    async fn run_summary(
        &self,
        request_id: Uuid,
        video: &[u8],
        filename: &str,
    ) -> std::result::Result<String, PipelineError> {
        let paths = ScratchPaths::new(&self.temp_dir, request_id, filename);

        let video_file = ScratchFile::write(paths.video, video)
            .await
            .map_err(|e| PipelineError::new(Stage::Upload, into_storage_failure(e)))?;
        self.transition(request_id, PipelineState::VideoStored);

        let transcription = self
            .run_stage(Stage::Transcription, self.transcriber.transcribe(video_file.path()))
            .await;
        // The video is only needed by the transcription stage
        drop(video_file);
        let transcript = transcription?;
        debug!("Transcribed {} characters", transcript.char_count());
        self.transition(request_id, PipelineState::Transcribed);

        let transcript_file = ScratchFile::write(paths.transcript, transcript.text.as_bytes())
            .await
            .map_err(|e| PipelineError::new(Stage::Transcription, into_storage_failure(e)))?;

        let summary = self
            .run_stage(Stage::Summarization, self.summarizer.summarize(transcript_file.path()))
            .await?;
        drop(transcript_file);
        self.transition(request_id, PipelineState::Summarized);

        Ok(summary)
    }

    /// Run one stage call behind its gate and timeout.
    async fn run_stage<T, F>(&self, stage: Stage, call: F) -> std::result::Result<T, PipelineError>
    where
        F: Future<Output = Result<T>>,
    {
        let _permit = match self.gates.for_stage(stage) {
            Some(gate) => Some(gate.acquire().await.map_err(|e| {
                PipelineError::new(stage, OmslagError::Unexpected(format!("stage gate closed: {}", e)))
            })?),
            None => None,
        };

        let result = match tokio::time::timeout(self.stage_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(timeout_error(stage, self.stage_timeout)),
        };

        result.map_err(|e| {
            let e = match stage {
                Stage::ImageGeneration => into_generation_failure(e),
                _ => e,
            };
            PipelineError::new(stage, e)
        })
    }

    fn transition(&self, request_id: Uuid, state: PipelineState) {
        debug!(%request_id, ?state, "Pipeline transition");
    }

    fn finish<T>(&self, request_id: Uuid, result: &std::result::Result<T, PipelineError>) {
        match result {
            Ok(_) => {
                self.transition(request_id, PipelineState::Completed);
                info!(%request_id, "Request completed");
            }
            Err(e) => {
                self.transition(request_id, PipelineState::Failed(e.stage));
                warn!(%request_id, stage = %e.stage, kind = %e.kind(), "Request failed: {}", e.source);
            }
        }
    }
}

/// Scratch writes only ever fail as storage failures.
fn into_storage_failure(err: OmslagError) -> OmslagError {
    match err {
        OmslagError::StorageFailure { .. } => err,
        other => OmslagError::Unexpected(other.to_string()),
    }
}

fn timeout_error(stage: Stage, timeout: Duration) -> OmslagError {
    let message = format!("timed out after {:.1}s", timeout.as_secs_f64());
    match stage {
        Stage::ImageGeneration => OmslagError::generation(message),
        Stage::Upload => OmslagError::Unexpected(message),
        _ => OmslagError::inference(stage, message),
    }
}
