//! Image generation stage for Omslag.
//!
//! Every failure inside a generator, whatever its origin, is reported as a
//! single `GenerationFailure` that carries the original cause.

mod openai;

pub use openai::OpenAiImageGenerator;

use crate::config::ImageSettings;
use crate::error::{OmslagError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SIGNATURE: &[u8] = b"\xFF\xD8\xFF";

/// Trait for text-to-image services.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Render `prompt` into exactly one image at `output_path`.
    ///
    /// Missing parent directories are created and an existing file is
    /// overwritten. Returns the path that was written.
    async fn generate_image(&self, prompt: &str, output_path: &Path) -> Result<PathBuf>;
}

/// Build the configured image backend.
pub fn create_image_generator(settings: &ImageSettings) -> Result<Arc<dyn ImageGenerator>> {
    Ok(Arc::new(OpenAiImageGenerator::with_config(settings)?))
}

/// Collapse any error into `GenerationFailure`, keeping existing ones as they are.
pub fn into_generation_failure(err: OmslagError) -> OmslagError {
    match err {
        OmslagError::GenerationFailure { .. } => err,
        other => OmslagError::generation(other),
    }
}

/// Write image bytes to `output_path`, creating parent directories.
pub async fn write_image(output_path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output_path, bytes).await?;
    Ok(output_path.to_path_buf())
}

/// MIME type of a raster image, sniffed from its leading bytes.
pub fn detect_content_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(PNG_SIGNATURE) {
        Some("image/png")
    } else if bytes.starts_with(JPEG_SIGNATURE) {
        Some("image/jpeg")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// File extension for a MIME type returned by [`detect_content_type`].
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}
