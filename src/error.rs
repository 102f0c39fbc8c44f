//! Error types for Omslag.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed cause carried by [`OmslagError::GenerationFailure`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Library-level error type for Omslag operations.
#[derive(Error, Debug)]
pub enum OmslagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Could not store {}: {reason}", path.display())]
    StorageFailure { path: PathBuf, reason: String },

    #[error("{stage} inference failed: {message}")]
    InferenceFailure { stage: Stage, message: String },

    #[error("Image generation failed: {source}")]
    GenerationFailure {
        #[source]
        source: BoxError,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl OmslagError {
    /// Build an inference failure for a model-backed stage.
    pub fn inference(stage: Stage, message: impl Into<String>) -> Self {
        Self::InferenceFailure {
            stage,
            message: message.into(),
        }
    }

    /// Wrap any cause as an image generation failure.
    pub fn generation(source: impl Into<BoxError>) -> Self {
        Self::GenerationFailure {
            source: source.into(),
        }
    }

    /// Build a storage failure for a path.
    pub fn storage(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::StorageFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// The caller-facing classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OmslagError::NotFound(_) => ErrorKind::NotFound,
            OmslagError::StorageFailure { .. } => ErrorKind::StorageFailure,
            OmslagError::InferenceFailure { .. } => ErrorKind::InferenceFailure,
            OmslagError::GenerationFailure { .. } => ErrorKind::GenerationFailure,
            OmslagError::InvalidInput(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::Unexpected,
        }
    }
}

/// Result type alias for Omslag operations.
pub type Result<T> = std::result::Result<T, OmslagError>;

/// Error classification surfaced to callers of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    StorageFailure,
    InferenceFailure,
    GenerationFailure,
    /// The caller sent a request that cannot be processed.
    InvalidInput,
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::StorageFailure => "storage_failure",
            ErrorKind::InferenceFailure => "inference_failure",
            ErrorKind::GenerationFailure => "generation_failure",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step of the cover pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Persisting the uploaded video to scratch storage.
    Upload,
    Transcription,
    Summarization,
    ImageGeneration,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Upload => "upload",
            Stage::Transcription => "transcription",
            Stage::Summarization => "summarization",
            Stage::ImageGeneration => "image_generation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-level failure naming the one stage that failed.
#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: OmslagError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: OmslagError) -> Self {
        Self { stage, source }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            OmslagError::NotFound(PathBuf::from("/tmp/x.txt")).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            OmslagError::storage("/tmp/x.mp4", "disk full").kind(),
            ErrorKind::StorageFailure
        );
        assert_eq!(
            OmslagError::inference(Stage::Transcription, "decoder crashed").kind(),
            ErrorKind::InferenceFailure
        );
        assert_eq!(
            OmslagError::generation("out of memory").kind(),
            ErrorKind::GenerationFailure
        );
        assert_eq!(
            OmslagError::InvalidInput("empty upload".to_string()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(ErrorKind::InvalidInput.as_str(), "invalid_input");
        assert_eq!(
            OmslagError::Config("bad".to_string()).kind(),
            ErrorKind::Unexpected
        );
    }

    #[test]
    fn test_generation_failure_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "CUDA out of memory");
        let err = OmslagError::generation(io);

        assert!(err.to_string().contains("CUDA out of memory"));
        let source = std::error::Error::source(&err).expect("cause is preserved");
        assert_eq!(source.to_string(), "CUDA out of memory");
    }

    #[test]
    fn test_pipeline_error_names_stage() {
        let err = PipelineError::new(
            Stage::Summarization,
            OmslagError::NotFound(PathBuf::from("/tmp/t.txt")),
        );
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("summarization stage failed"));
    }
}
