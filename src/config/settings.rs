//! Configuration settings for Omslag.

use super::Device;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub summarization: SummarizationSettings,
    pub image: ImageSettings,
    pub pipeline: PipelineSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for per-request scratch files (uploaded video, transcript).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Device for locally executed models (auto, cpu, cuda).
    pub device: Device,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.omslag".to_string(),
            temp_dir: "/tmp/omslag".to_string(),
            log_level: "info".to_string(),
            device: Device::Auto,
        }
    }
}

/// Transcription backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProvider {
    /// OpenAI hosted Whisper API (default).
    #[default]
    OpenAI,
    /// The `whisper` command line tool running on this machine.
    Local,
}

impl std::str::FromStr for TranscriptionProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "api" => Ok(TranscriptionProvider::OpenAI),
            "local" | "whisper" => Ok(TranscriptionProvider::Local),
            _ => Err(format!("Unknown transcription provider: {}", s)),
        }
    }
}

impl std::fmt::Display for TranscriptionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptionProvider::OpenAI => write!(f, "openai"),
            TranscriptionProvider::Local => write!(f, "local"),
        }
    }
}

/// Transcription stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Transcription provider (openai, local).
    pub provider: TranscriptionProvider,
    /// Hosted model for the openai provider.
    pub model: String,
    /// Whisper model size for the local provider (tiny, base, small, ...).
    pub local_model: String,
    /// Command used to run the local provider.
    pub local_command: String,
    /// Optional language hint (ISO 639-1).
    pub language: Option<String>,
    /// Maximum concurrent calls into the transcription model.
    pub max_concurrent: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: TranscriptionProvider::OpenAI,
            model: "whisper-1".to_string(),
            local_model: "base".to_string(),
            local_command: "whisper".to_string(),
            language: None,
            max_concurrent: 1,
        }
    }
}

/// Summarization stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationSettings {
    /// Chat model used for summaries.
    pub model: String,
    /// Character budget for preamble plus transcript; the tail beyond it is dropped.
    pub max_input_chars: usize,
    /// Lower bound of the summary length band, in tokens.
    pub min_tokens: u32,
    /// Upper bound of the summary length band, in tokens.
    pub max_tokens: u32,
    /// Seed sent with every request so decoding is repeatable.
    pub seed: i64,
    /// Maximum concurrent calls into the summarization model.
    pub max_concurrent: usize,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_input_chars: 1024,
            min_tokens: 50,
            max_tokens: 120,
            seed: 42,
            max_concurrent: 4,
        }
    }
}

/// Image generation stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Image model.
    pub model: String,
    /// Output size as WIDTHxHEIGHT.
    pub size: String,
    /// Directory receiving generated covers.
    pub output_dir: String,
    /// Fixed file name for every cover. When unset each request gets `<request id>.png`.
    pub file_name: Option<String>,
    /// Maximum concurrent calls into the image model.
    pub max_concurrent: usize,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            output_dir: "~/.omslag/covers".to_string(),
            file_name: None,
            max_concurrent: 1,
        }
    }
}

/// Pipeline-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Upper bound for a single stage call, in seconds.
    pub stage_timeout_seconds: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            stage_timeout_seconds: 600,
        }
    }
}

impl PipelineSettings {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_seconds)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Largest accepted upload, in megabytes.
    pub max_upload_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { max_upload_mb: 512 }
    }
}

impl ServerSettings {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::OmslagError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("omslag")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded cover output directory.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.image.output_dir)
    }
}
