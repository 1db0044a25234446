use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::subtitle_processor::SubtitleFormat;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Subtitle retrieval settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Anthropic settings for the study analysis
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Directory where `.nihongocards` files are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            fetcher: FetcherConfig::default(),
            anthropic: AnthropicConfig::default(),
            server: ServerConfig::default(),
            output_dir: default_output_dir(),
            log_level: LogLevel::default(),
        }
    }
}

/// Settings for the external subtitle retrieval tool (yt-dlp)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FetcherConfig {
    // @field: Executable to run
    #[serde(default = "default_program")]
    pub program: String,

    // @field: Arguments placed before the yt-dlp arguments (e.g. ["-m", "yt_dlp"] with python3)
    #[serde(default)]
    pub program_args: Vec<String>,

    // @field: Subtitle language requested from the tool
    #[serde(default = "default_sub_lang")]
    pub sub_lang: String,

    // @field: Format the tool converts subtitles to ("vtt" or "srt")
    #[serde(default = "default_convert_subs")]
    pub convert_subs: String,

    // @field: Per-attempt time budget
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Browser to borrow cookies from (e.g. "chrome")
    #[serde(default)]
    pub cookies_from_browser: Option<String>,

    // @field: Extra arguments appended after the common ones
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            program_args: Vec::new(),
            sub_lang: default_sub_lang(),
            convert_subs: default_convert_subs(),
            timeout_secs: default_fetch_timeout_secs(),
            cookies_from_browser: None,
            extra_args: Vec::new(),
        }
    }
}

impl FetcherConfig {
    /// The subtitle format the tool is asked to produce
    pub fn subtitle_format(&self) -> Result<SubtitleFormat> {
        self.convert_subs.parse()
    }
}

/// Anthropic service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnthropicConfig {
    /// API key for the service; `ANTHROPIC_API_KEY` takes precedence
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL (optional, for proxies)
    #[serde(default = "default_anthropic_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_anthropic_model")]
    pub model: String,

    /// Maximum number of tokens in the answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_anthropic_timeout_secs")]
    pub timeout_secs: u64,

    /// Transcripts longer than this many characters are truncated before sending
    #[serde(default = "default_max_transcript_chars")]
    pub max_transcript_chars: usize,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_anthropic_endpoint(),
            model: default_anthropic_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_anthropic_timeout_secs(),
            max_transcript_chars: default_max_transcript_chars(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Listening port; the `PORT` environment variable overrides it
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Port to listen on, honoring the `PORT` environment variable
    pub fn effective_port(&self) -> u16 {
        std::env::var("PORT")
            .ok()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(self.port)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_program() -> String {
    "yt-dlp".to_string()
}

fn default_sub_lang() -> String {
    "ja".to_string()
}

fn default_convert_subs() -> String {
    "vtt".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    60
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_anthropic_timeout_secs() -> u64 {
    120
}

fn default_max_transcript_chars() -> usize {
    8000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Environment variable consulted first for the Anthropic API key
pub const API_KEY_ENV_VAR: &str = "ANTHROPIC_API_KEY";

impl Config {
    /// Load the configuration file, creating it with defaults when missing
    pub fn load_or_create<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        if config_path.exists() {
            let file = File::open(config_path)
                .with_context(|| format!("Failed to open config file: {}", config_path.display()))?;

            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", config_path.display());

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", config_path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.program.trim().is_empty() {
            return Err(anyhow!("fetcher.program must not be empty"));
        }

        if self.fetcher.sub_lang.trim().is_empty() {
            return Err(anyhow!("fetcher.sub_lang must not be empty"));
        }

        if self.fetcher.timeout_secs == 0 {
            return Err(anyhow!("fetcher.timeout_secs must be greater than zero"));
        }

        self.fetcher.subtitle_format()
            .context("fetcher.convert_subs must be \"vtt\" or \"srt\"")?;

        if self.anthropic.max_tokens == 0 {
            return Err(anyhow!("anthropic.max_tokens must be greater than zero"));
        }

        if self.anthropic.max_transcript_chars == 0 {
            return Err(anyhow!("anthropic.max_transcript_chars must be greater than zero"));
        }

        Ok(())
    }

    /// Resolve the Anthropic API key.
    ///
    /// Order: the `ANTHROPIC_API_KEY` value, then the key supplied with the
    /// request, then the config file. Blank values are skipped.
    pub fn resolve_api_key_with(&self, env_key: Option<&str>, request_key: Option<&str>) -> Option<String> {
        Self::first_non_blank([
            env_key,
            request_key,
            Some(self.anthropic.api_key.as_str()),
        ])
    }

    fn first_non_blank<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
        candidates
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|key| !key.is_empty())
            .map(str::to_string)
    }
}
