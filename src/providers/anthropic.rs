use std::time::Duration;
use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use reqwest::{Client, StatusCode};
use log::{debug, error};

use crate::errors::ProviderError;
use super::Provider;

/// Anthropic client for interacting with Anthropic API
pub struct Anthropic {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to public API)
    endpoint: String,
}

impl std::fmt::Debug for Anthropic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Anthropic")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Anthropic message request
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<AnthropicMessage>,

    /// System prompt to guide the AI
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// Role of the message sender (user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Token usage information
#[derive(Debug, Default, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens
    pub input_tokens: u32,
    /// Number of output tokens
    pub output_tokens: u32,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    /// The content of the response
    pub content: Vec<AnthropicContent>,
    /// Token usage information
    #[serde(default)]
    pub usage: TokenUsage,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicContent {
    /// The type of content
    #[serde(rename = "type")]
    pub content_type: String,

    /// The actual text content
    #[serde(default)]
    pub text: String,
}

impl AnthropicRequest {
    /// Create a new Anthropic request
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system: None,
            max_tokens,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(AnthropicMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn messages(&self) -> &[AnthropicMessage] {
        &self.messages
    }
}

impl AnthropicResponse {
    /// Build a response holding a single text block
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![AnthropicContent {
                content_type: "text".to_string(),
                text: text.into(),
            }],
            usage: TokenUsage::default(),
        }
    }

    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        self.content.iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect()
    }
}

impl Anthropic {
    /// Create a new Anthropic client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::with_timeout(api_key, endpoint, Duration::from_secs(120))
    }

    /// Create a new Anthropic client with a custom request timeout
    pub fn with_timeout(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    fn messages_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.anthropic.com/v1/messages".to_string()
        } else {
            format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
        }
    }

    /// Map a non-success status to the matching provider error
    fn error_for_status(status: StatusCode, body: String) -> ProviderError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(body),
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(body),
            _ => ProviderError::ApiError {
                status_code: status.as_u16(),
                message: body,
            },
        }
    }
}

#[async_trait]
impl Provider for Anthropic {
    type Request = AnthropicRequest;
    type Response = AnthropicResponse;

    /// Complete a messages request
    async fn complete(&self, request: AnthropicRequest) -> Result<AnthropicResponse, ProviderError> {
        let api_url = self.messages_url();
        debug!("Sending messages request to {} (model {})", api_url, request.model);

        let response = self.client.post(&api_url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to Anthropic API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Anthropic API error ({}): {}", status, error_text);
            return Err(Self::error_for_status(status, error_text));
        }

        let anthropic_response = response.json::<AnthropicResponse>().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        debug!(
            "Anthropic usage: {} input tokens, {} output tokens",
            anthropic_response.usage.input_tokens, anthropic_response.usage.output_tokens
        );

        Ok(anthropic_response)
    }
}
