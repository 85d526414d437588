use prbot_core::{LlmConfig, PrBotError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use prbot_review::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage::user("Review this code");
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    /// A user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use prbot_review::llm::Role;
///
/// assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input.
    User,
}

/// JSON schema the model must follow exactly.
///
/// Sent as `response_format: {type: "json_schema", json_schema: {..., strict: true}}`.
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    /// Schema name reported to the provider.
    pub name: String,
    /// JSON Schema object. Must set `additionalProperties: false`.
    pub schema: serde_json::Value,
}

impl ResponseSchema {
    fn to_response_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": self.name,
                "strict": true,
                "schema": self.schema,
            },
        })
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    refusal: Option<String>,
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes the `/v1/chat/completions` endpoint.
///
/// # Examples
///
/// ```
/// use prbot_core::LlmConfig;
/// use prbot_review::llm::LlmClient;
///
/// let config = LlmConfig {
///     api_key: Some("test-key".into()),
///     ..LlmConfig::default()
/// };
/// let client = LlmClient::new(&config).unwrap();
/// assert_eq!(client.model(), "gpt-4o");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: String,
}

impl LlmClient {
    /// Create a new LLM client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PrBotError::Config`] if no API key is configured, or
    /// [`PrBotError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, PrBotError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            PrBotError::Config(
                "OPENAI_API_KEY not set. Set it in the environment or in .prbot.toml".into(),
            )
        })?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PrBotError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a chat completion request and return the text response.
    ///
    /// With a `schema`, the provider is asked for strict schema-constrained
    /// output; without one, the reply is free text.
    ///
    /// # Errors
    ///
    /// Returns [`PrBotError::Http`] or [`PrBotError::Api`] on request
    /// failure, [`PrBotError::Refusal`] if the model declines, and
    /// [`PrBotError::Parse`] if the reply has no content.
    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        schema: Option<&ResponseSchema>,
    ) -> Result<String, PrBotError> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com")
            .trim_end_matches('/');
        let url = format!("{base_url}/v1/chat/completions");

        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "max_completion_tokens": self.config.max_output_tokens,
        });
        if let Some(schema) = schema {
            body["response_format"] = schema.to_response_format();
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| PrBotError::Http(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(PrBotError::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PrBotError::Http(format!("failed to read response: {e}")))?;
        let completion: CompletionResponse = serde_json::from_slice(&bytes)?;

        let Some(choice) = completion.choices.into_iter().next() else {
            return Err(PrBotError::Parse("completion has no choices".into()));
        };
        if let Some(refusal) = choice.message.refusal {
            return Err(PrBotError::Refusal(refusal));
        }
        let content = choice
            .message
            .content
            .ok_or_else(|| PrBotError::Parse("completion has no content".into()))?;

        debug!(model = %self.config.model, chars = content.len(), "model replied");
        Ok(content.trim().to_string())
    }
}
