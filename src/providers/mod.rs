/*!
 * Provider implementations for the study analysis.
 *
 * This module contains client implementations for LLM providers:
 * - Anthropic: Anthropic Messages API integration
 * - Mock: canned responses for tests and offline runs
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::errors::ProviderError;
use self::anthropic::{AnthropicRequest, AnthropicResponse};

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the study analyzer.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;
}

/// Any provider speaking the Messages request/response shapes
pub type MessagesProvider = dyn Provider<Request = AnthropicRequest, Response = AnthropicResponse>;

/// Builds a provider for a resolved API key.
///
/// Keys can arrive per request, so providers are created on demand.
pub type ProviderFactory = Arc<dyn Fn(&str) -> Box<MessagesProvider> + Send + Sync>;

pub mod anthropic;
pub mod mock;
