/*!
 * Error types for the animejp application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors raised by a single invocation of the subtitle retrieval tool.
///
/// These never leave the fetcher: an attempt that fails this way simply
/// counts as "no subtitle file produced".
#[derive(Error, Debug)]
pub enum ToolError {
    /// The tool process could not be started
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool did not finish within its time budget
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Any other I/O failure while running the tool or reading its output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while turning a transcript into study material
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The model answered, but not with the expected JSON document
    #[error("Invalid JSON in model response: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// No URL was supplied
    #[error("No video URL supplied")]
    MissingUrl,

    /// The URL is not an absolute http(s) URL
    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    /// No Anthropic API key could be resolved
    #[error("No Anthropic API key configured")]
    MissingApiKey,

    /// Every fetch strategy came back without a subtitle file
    #[error("No Japanese subtitles found")]
    SubtitlesNotFound,

    /// Subtitles were found but normalized to nothing
    #[error("Subtitles for \"{0}\" contain no dialogue")]
    EmptyTranscript(String),

    /// Error from the study analysis
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        Self::Analysis(AnalysisError::Provider(error))
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
