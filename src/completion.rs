#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::time::Duration;

use async_openai::{
    Client as OpenAIClient,
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    },
};
use async_trait::async_trait;
use bon::Builder;
use tokio::time::timeout;

use crate::config::{self, OpenAiEnv};

/// A single prompt sent to the completion service.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(on(String, into))]
pub struct CompletionRequest {
    /// User-facing prompt text.
    pub prompt:              String,
    /// Optional system instructions sent ahead of the prompt.
    pub system_instructions: Option<String>,
    /// Sampling temperature.
    #[builder(default = 0.7)]
    pub temperature:         f32,
    /// Upper bound on generated tokens.
    #[builder(default = 400)]
    pub max_tokens:          u32,
}

/// Ways a completion call can fail. All of them are treated alike by callers:
/// the call produced no usable text.
#[derive(thiserror::Error, Debug)]
pub enum CompletionError {
    /// The call did not finish within the configured bound.
    #[error("completion service did not answer within {0:?}")]
    Timeout(Duration),
    /// The API returned an error or the request could not be built.
    #[error(transparent)]
    Request(#[from] OpenAIError),
    /// The API answered without any text.
    #[error("completion service returned an empty response")]
    EmptyResponse,
    /// No credentials were configured.
    #[error("OPENAI_API_KEY must be set to call the completion service")]
    NotConfigured,
    /// Any other failure, e.g. from a test double.
    #[error("completion service failed: {0}")]
    Other(String),
}

/// The external text-completion service: prompt in, text out, or failure.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Runs one completion. Implementations must not retry.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

/// `CompletionService` backed by an OpenAI-compatible chat completions API.
pub struct OpenAiCompletion {
    /// HTTP client for the configured endpoint.
    client:      OpenAIClient<OpenAIConfig>,
    /// Model identifier.
    model:       String,
    /// Temperature override from the environment, if any.
    temperature: Option<f32>,
    /// Bound applied to every call.
    deadline:    Duration,
}

impl OpenAiCompletion {
    /// Creates an adapter from explicit settings.
    pub fn new(env: &OpenAiEnv, deadline: Duration) -> Self {
        let client = OpenAIClient::with_config(
            OpenAIConfig::new()
                .with_api_base(env.api_base().to_owned())
                .with_api_key(env.api_key().to_owned()),
        );

        Self {
            client,
            model: env.model().to_owned(),
            temperature: env.temperature(),
            deadline,
        }
    }

    /// Creates an adapter from the global configuration.
    pub fn from_config() -> Result<Self, CompletionError> {
        let handle = config::get();
        let env = handle.openai().ok_or(CompletionError::NotConfigured)?;
        Ok(Self::new(env, handle.completion_timeout()))
    }

    /// Builds the chat messages for a request.
    fn messages(
        request: &CompletionRequest,
    ) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system_instructions {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.clone())
                    .name("Instructor".to_string())
                    .build()?
                    .into(),
            );
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.clone())
                .name("Student".to_string())
                .build()?
                .into(),
        );
        Ok(messages)
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let body = CreateChatCompletionRequest {
            model: self.model.clone(),
            messages: Self::messages(&request)?,
            temperature: Some(self.temperature.unwrap_or(request.temperature)),
            max_completion_tokens: Some(request.max_tokens),
            n: Some(1),
            stream: Some(false),
            ..Default::default()
        };

        let chat = self.client.chat();
        let call = chat.create(body);
        let response = timeout(self.deadline, call)
            .await
            .map_err(|_| CompletionError::Timeout(self.deadline))??;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}
