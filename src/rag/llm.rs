//! Chat model abstraction over OpenAI-compatible completion APIs.

use crate::config::LlmSettings;
use crate::error::{Result, TubeQaError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// A single message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    System(String),
    User(String),
    Assistant(String),
}

impl ChatMessage {
    pub fn content(&self) -> &str {
        match self {
            ChatMessage::System(c) | ChatMessage::User(c) | ChatMessage::Assistant(c) => c,
        }
    }
}

/// A language model that completes a conversation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the next assistant message.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Model identifier, for display.
    fn model_name(&self) -> &str;
}

/// Chat model served over the OpenAI chat completions protocol (Groq by default).
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a model client from settings and a resolved API key.
    pub fn new(settings: &LlmSettings, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: create_client(settings, api_key)?,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
        let built: ChatCompletionRequestMessage = match message {
            ChatMessage::System(content) => ChatCompletionRequestSystemMessageArgs::default()
                .content(content.as_str())
                .build()
                .map_err(|e| TubeQaError::Rag(e.to_string()))?
                .into(),
            ChatMessage::User(content) => ChatCompletionRequestUserMessageArgs::default()
                .content(content.as_str())
                .build()
                .map_err(|e| TubeQaError::Rag(e.to_string()))?
                .into(),
            ChatMessage::Assistant(content) => ChatCompletionRequestAssistantMessageArgs::default()
                .content(content.as_str())
                .build()
                .map_err(|e| TubeQaError::Rag(e.to_string()))?
                .into(),
        };
        Ok(built)
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let messages = messages
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| TubeQaError::Rag(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            TubeQaError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| TubeQaError::Rag("Empty response from LLM".to_string()))?
            .clone();

        debug!("Model returned {} characters", answer.len());
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
