//! OpenAiCompletion -- concrete [`CompletionBackend`] for the relay.
//!
//! Sends the fixed system instruction plus the bounded conversation
//! history to an OpenAI-compatible chat-completion endpoint and returns
//! the trimmed text of the first choice. Non-streaming only.
//!
//! Uses [`async_openai`] for type-safe request/response handling.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use secrecy::ExposeSecret;

use chatrelay_core::llm::CompletionBackend;
use chatrelay_types::chat::{MessageRole, Turn};
use chatrelay_types::config::CompletionConfig;
use chatrelay_types::llm::CompletionError;

/// Chat-completion client with fixed model, temperature, and output cap.
///
/// Does NOT derive Debug to prevent accidental exposure of the API key
/// stored inside the `async_openai::Client`.
pub struct OpenAiCompletion {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
}

impl OpenAiCompletion {
    /// Build from configuration. Returns `None` when no API key is
    /// present -- the relay then runs with the backend permanently
    /// unavailable rather than holding a client that cannot authenticate.
    pub fn from_config(config: &CompletionConfig) -> Option<Self> {
        let api_key = config.api_key.as_ref()?;
        let openai_config = OpenAIConfig::new().with_api_key(api_key.expose_secret());

        Some(Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
        })
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build a [`CreateChatCompletionRequest`]: system instruction first,
    /// then the history in order.
    fn build_request(&self, history: &[Turn]) -> CreateChatCompletionRequest {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 1);

        messages.push(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(
                    self.system_prompt.clone(),
                ),
                name: None,
            },
        ));

        for turn in history {
            let message = match turn.role {
                MessageRole::System => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage {
                        content: ChatCompletionRequestSystemMessageContent::Text(
                            turn.content.clone(),
                        ),
                        name: None,
                    },
                ),
                MessageRole::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(
                            turn.content.clone(),
                        ),
                        name: None,
                    },
                ),
                MessageRole::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessage {
                            content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                                turn.content.clone(),
                            )),
                            refusal: None,
                            name: None,
                            audio: None,
                            tool_calls: None,
                            function_call: None,
                        },
                    )
                }
            };
            messages.push(message);
        }

        CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_completion_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            ..Default::default()
        }
    }
}

impl CompletionBackend for OpenAiCompletion {
    async fn complete(&self, history: &[Turn]) -> Result<String, CompletionError> {
        let request = self.build_request(history);

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}

/// Map an `async_openai::error::OpenAIError` to a [`CompletionError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> CompletionError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "authentication_error"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
                || api_err.message.contains("Invalid API key")
            {
                CompletionError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                CompletionError::RateLimited
            } else {
                CompletionError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401) => CompletionError::AuthenticationFailed,
            Some(429) => CompletionError::RateLimited,
            _ => CompletionError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, content) => {
            CompletionError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => CompletionError::InvalidRequest(msg.clone()),
        _ => CompletionError::Provider {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn config_with_key() -> CompletionConfig {
        let mut config = CompletionConfig::default();
        config.api_key = Some(SecretString::from("sk-test-not-real"));
        config
    }

    #[test]
    fn test_from_config_requires_api_key() {
        assert!(OpenAiCompletion::from_config(&CompletionConfig::default()).is_none());
        assert!(OpenAiCompletion::from_config(&config_with_key()).is_some());
    }

    #[test]
    fn test_from_config_carries_model_settings() {
        let backend = OpenAiCompletion::from_config(&config_with_key()).unwrap();
        assert_eq!(backend.model(), "gpt-4o-mini");
        assert_eq!(backend.temperature, 0.2);
        assert_eq!(backend.max_tokens, 150);
    }

    #[test]
    fn test_build_request_prepends_system_instruction() {
        let backend = OpenAiCompletion::from_config(&config_with_key()).unwrap();
        let history = vec![Turn::user("Hi"), Turn::assistant("Hello!"), Turn::user("Q1")];

        let request = backend.build_request(&history);
        assert_eq!(request.model, "gpt-4o-mini");
        // 1 system + 3 history
        assert_eq!(request.messages.len(), 4);
        assert!(matches!(
            request.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            request.messages[1],
            ChatCompletionRequestMessage::User(_)
        ));
        assert!(matches!(
            request.messages[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
        assert_eq!(request.max_completion_tokens, Some(150));
        assert_eq!(request.temperature, Some(0.2));
        assert!(request.stream.is_none());
    }

    #[test]
    fn test_build_request_empty_history_still_has_system() {
        let backend = OpenAiCompletion::from_config(&config_with_key()).unwrap();
        let request = backend.build_request(&[]);
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_map_openai_error_auth() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Incorrect API key provided".to_string(),
            r#type: Some("authentication_error".to_string()),
            param: None,
            code: None,
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, CompletionError::AuthenticationFailed));
    }

    #[test]
    fn test_map_openai_error_rate_limit() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Rate limit exceeded".to_string(),
            r#type: Some("rate_limit_error".to_string()),
            param: None,
            code: None,
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, CompletionError::RateLimited));
    }

    #[test]
    fn test_map_openai_error_invalid_argument() {
        use async_openai::error::OpenAIError;
        let err = map_openai_error(OpenAIError::InvalidArgument("bad arg".to_string()));
        assert!(matches!(err, CompletionError::InvalidRequest(_)));
    }
}
