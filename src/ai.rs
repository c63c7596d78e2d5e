use crate::error::AIError;
use crate::message::{Message, MessageType};
use crate::settings::Settings;

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use tokio::time::{Duration, timeout};

// The transport itself carries no deadline, so the client enforces one.
pub const TURN_TIMEOUT: Duration = Duration::from_secs(120);

/// Thin client over the hosted LLM proxy. The proxy speaks the OpenAI chat
/// completion dialect; everything above this struct treats the narrator as
/// an opaque text-completion function.
pub struct NarratorClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl NarratorClient {
    pub fn new(settings: &Settings) -> Self {
        let mut config = OpenAIConfig::new().with_api_base(&settings.proxy_base_url);
        if let Some(api_key) = &settings.api_key {
            config = config.with_api_key(api_key);
        }
        Self {
            client: Client::with_config(config),
            model: settings.model.clone(),
        }
    }

    /// One completion round-trip: system prompt plus the conversation so
    /// far, back as raw narrator text. Local system notices (error lines,
    /// placeholders) stay out of the payload.
    pub async fn request_turn(
        &self,
        system_prompt: &str,
        history: &[Message],
    ) -> Result<String, AIError> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()?
                .into(),
        ];
        for message in history {
            match message.message_type {
                MessageType::User => messages.push(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(message.content.as_str())
                        .build()?
                        .into(),
                ),
                MessageType::Game => messages.push(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(message.content.as_str())
                        .build()?
                        .into(),
                ),
                MessageType::System => {}
            }
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()?;

        let response = timeout(TURN_TIMEOUT, self.client.chat().create(request))
            .await
            .map_err(|_| AIError::Timeout)??;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(AIError::NoMessageFound)?;

        if content.trim().is_empty() {
            return Err(AIError::EmptyCompletion);
        }
        Ok(content)
    }
}
