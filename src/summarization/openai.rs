//! Chat-completion backed summarizer.

use super::{Summarizer, SummaryWindow};
use crate::config::{Prompts, SummarizationSettings};
use crate::error::{OmslagError, Result, Stage};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, instrument};

/// Summarizer using an OpenAI chat model with greedy, seeded decoding.
pub struct OpenAiSummarizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    system_prompt: String,
    window: SummaryWindow,
    max_tokens: u32,
    seed: i64,
}

impl OpenAiSummarizer {
    /// Create a summarizer from settings and prompt templates.
    pub fn with_config(settings: &SummarizationSettings, prompts: &Prompts) -> Result<Self> {
        let mut vars = HashMap::new();
        vars.insert("min_tokens".to_string(), settings.min_tokens.to_string());
        vars.insert("max_tokens".to_string(), settings.max_tokens.to_string());
        let system_prompt = prompts.render_with_custom(&prompts.summarization.system, &vars);
        let preamble = prompts.render_with_custom(&prompts.summarization.preamble, &vars);

        Ok(Self {
            client: create_client()?,
            model: settings.model.clone(),
            system_prompt,
            window: SummaryWindow::new(preamble, settings.max_input_chars),
            max_tokens: settings.max_tokens,
            seed: settings.seed,
        })
    }

    pub fn window(&self) -> &SummaryWindow {
        &self.window
    }

    /// Build the completion request for an already windowed input.
    ///
    /// Temperature 0 and a fixed seed make repeated calls on the same input
    /// return the same summary.
    pub fn request_for(&self, input: &str) -> Result<CreateChatCompletionRequest> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()
                .map_err(|e| OmslagError::inference(Stage::Summarization, e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(input.to_string())
                .build()
                .map_err(|e| OmslagError::inference(Stage::Summarization, e.to_string()))?
                .into(),
        ];

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0)
            .seed(self.seed)
            .max_completion_tokens(self.max_tokens)
            .build()
            .map_err(|e| OmslagError::inference(Stage::Summarization, e.to_string()))
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    #[instrument(skip(self), fields(text_source = %text_source.display(), model = %self.model))]
    async fn summarize(&self, text_source: &Path) -> Result<String> {
        let input = self.window.load(text_source).await?;
        let request = self.request_for(&input.text)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            OmslagError::inference(Stage::Summarization, format!("Chat API error: {}", e))
        })?;

        let summary = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                OmslagError::inference(Stage::Summarization, "Empty response from model")
            })?;

        debug!("Summarized {} input characters", input.text.chars().count());
        Ok(summary)
    }
}
