//! OpenAI images API generator.

use super::{into_generation_failure, write_image, ImageGenerator};
use crate::config::ImageSettings;
use crate::error::{OmslagError, Result};
use crate::openai::{create_client, create_http_client};
use async_openai::types::{
    CreateImageRequest, CreateImageRequestArgs, Image, ImageModel, ImageResponseFormat, ImageSize,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

/// Timeout for downloading the rendered image.
const DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// Image generator backed by the OpenAI images API.
pub struct OpenAiImageGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    http: reqwest::Client,
    model: String,
    size: ImageSize,
}

impl OpenAiImageGenerator {
    /// Create a generator from settings.
    pub fn with_config(settings: &ImageSettings) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            http: create_http_client(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))?,
            model: settings.model.clone(),
            size: parse_size(&settings.size)?,
        })
    }

    /// Build the images API request for a prompt.
    pub fn request_for(&self, prompt: &str) -> Result<CreateImageRequest> {
        CreateImageRequestArgs::default()
            .prompt(prompt)
            .model(image_model(&self.model))
            .n(1)
            .size(self.size.clone())
            .response_format(ImageResponseFormat::Url)
            .build()
            .map_err(|e| OmslagError::OpenAI(format!("Failed to build request: {}", e)))
    }

    async fn render(&self, prompt: &str, output_path: &Path) -> Result<PathBuf> {
        let request = self.request_for(prompt)?;

        let response = self
            .client
            .images()
            .create(request)
            .await
            .map_err(|e| OmslagError::OpenAI(format!("Images API error: {}", e)))?;

        let image = response
            .data
            .first()
            .ok_or_else(|| OmslagError::Unexpected("images API returned no image".to_string()))?;

        let bytes = match image.as_ref() {
            Image::Url { url, .. } => {
                debug!("Downloading rendered image");
                self.http
                    .get(url.as_str())
                    .send()
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?
            }
            Image::B64Json { .. } => {
                return Err(OmslagError::Unexpected(
                    "images API returned base64 data although a URL was requested".to_string(),
                ));
            }
        };

        write_image(output_path, &bytes).await
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    #[instrument(skip(self, prompt), fields(output_path = %output_path.display(), model = %self.model))]
    async fn generate_image(&self, prompt: &str, output_path: &Path) -> Result<PathBuf> {
        self.render(prompt, output_path)
            .await
            .map_err(into_generation_failure)
    }
}

fn image_model(model: &str) -> ImageModel {
    match model {
        "dall-e-2" => ImageModel::DallE2,
        "dall-e-3" => ImageModel::DallE3,
        other => ImageModel::Other(other.to_string()),
    }
}

/// Parse a `WIDTHxHEIGHT` setting into a supported size.
fn parse_size(size: &str) -> Result<ImageSize> {
    match size.trim().to_lowercase().as_str() {
        "256x256" => Ok(ImageSize::S256x256),
        "512x512" => Ok(ImageSize::S512x512),
        "1024x1024" => Ok(ImageSize::S1024x1024),
        "1792x1024" => Ok(ImageSize::S1792x1024),
        "1024x1792" => Ok(ImageSize::S1024x1792),
        other => Err(OmslagError::Config(format!("Unsupported image size: {}", other))),
    }
}
