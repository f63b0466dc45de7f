use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse,
    },
    Client,
};
use async_trait::async_trait;
use common::{error::AppError, utils::config::AppConfig};
use tracing::debug;

use crate::utils::image_parsing::create_image_request;

/// Base64 image payload handed to a vision-capable backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub base64_data: String,
    pub mime_type: String,
}

impl ImageInput {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_data)
    }
}

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AppError>;

    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &ImageInput,
    ) -> Result<String, AppError>;

    fn supports_images(&self) -> bool {
        true
    }
}

/// Chat-completions backend for any OpenAI-compatible endpoint.
pub struct OpenAiBackend {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    configured: bool,
}

impl OpenAiBackend {
    pub fn from_config(config: &AppConfig) -> Self {
        let client = Arc::new(Client::with_config(
            OpenAIConfig::new()
                .with_api_key(&config.openai_api_key)
                .with_api_base(&config.openai_base_url),
        ));
        Self {
            client,
            model: config.generation_model.clone(),
            configured: !config.openai_api_key.trim().is_empty(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Text of the first choice; a reply without content comes back empty.
    fn first_choice(response: CreateChatCompletionResponse) -> String {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([ChatCompletionRequestUserMessage::from(prompt).into()])
            .build()?;

        debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Sending chat completion"
        );
        let response = self.client.chat().create(request).await?;
        Ok(Self::first_choice(response))
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &ImageInput,
    ) -> Result<String, AppError> {
        let request = create_image_request(&self.model, prompt, image)?;

        debug!(model = %self.model, mime = %image.mime_type, "Sending image completion");
        let response = self.client.chat().create(request).await?;
        Ok(Self::first_choice(response))
    }

    fn supports_images(&self) -> bool {
        self.configured
    }
}
