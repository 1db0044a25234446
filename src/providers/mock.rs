/*!
 * Mock provider implementation for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::replying(text)` - Always answers with the given text
 * - `MockProvider::failing(kind)` - Always fails with the chosen error
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::providers::anthropic::{AnthropicRequest, AnthropicResponse};

/// Which error a failing mock produces
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockFailure {
    Authentication,
    RateLimit,
    Connection,
    Server,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with the given text
    Reply(String),
    /// Always fails with an error
    Failing(MockFailure),
}

/// Mock provider for testing analysis behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Number of requests received, shared between clones
    request_count: Arc<AtomicUsize>,
    /// User message of the most recent request
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a mock provider that always answers with `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Reply(text.into()))
    }

    /// Create a failing mock provider that always errors
    pub fn failing(failure: MockFailure) -> Self {
        Self::new(MockBehavior::Failing(failure))
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// User message of the last request, if any
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|prompt| prompt.clone())
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = AnthropicRequest;
    type Response = AnthropicResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);

        if let Ok(mut last) = self.last_prompt.lock() {
            *last = request.messages().last().map(|m| m.content.clone());
        }

        match &self.behavior {
            MockBehavior::Reply(text) => Ok(AnthropicResponse::from_text(text.clone())),
            MockBehavior::Failing(MockFailure::Authentication) => {
                Err(ProviderError::AuthenticationError("invalid x-api-key".to_string()))
            }
            MockBehavior::Failing(MockFailure::RateLimit) => {
                Err(ProviderError::RateLimitExceeded("Simulated rate limit".to_string()))
            }
            MockBehavior::Failing(MockFailure::Connection) => {
                Err(ProviderError::ConnectionError("Simulated connection failure".to_string()))
            }
            MockBehavior::Failing(MockFailure::Server) => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),
        }
    }
}
