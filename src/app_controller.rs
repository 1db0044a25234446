use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::analysis::{StudyAnalyzer, StudyItem};
use crate::app_config::{Config, API_KEY_ENV_VAR};
use crate::cards::{NihongoCards, CARDS_EXTENSION};
use crate::errors::AppError;
use crate::fetcher::{FetchedSubtitles, SubtitleFetcher};
use crate::file_utils::FileManager;
use crate::providers::{MessagesProvider, ProviderFactory};
use crate::providers::anthropic::Anthropic;

// @module: Application controller for the subtitle-to-cards workflow

/// Everything produced for one video
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub title: String,
    pub vocabulary: Vec<StudyItem>,
    pub grammar: Vec<StudyItem>,
    pub nihongocards: NihongoCards,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Subtitle acquisition
    fetcher: SubtitleFetcher,
    // @field: Prompt building and answer parsing
    analyzer: StudyAnalyzer,
    // @field: Creates a provider once the API key is known
    provider_factory: ProviderFactory,
    // @field: Value of ANTHROPIC_API_KEY captured at startup
    env_api_key: Option<String>,
}

impl Controller {
    // @method: Create a controller using yt-dlp and the Anthropic API
    pub fn with_config(config: Config) -> Result<Self> {
        let fetcher = SubtitleFetcher::from_config(&config.fetcher)?;

        let anthropic = config.anthropic.clone();
        let provider_factory: ProviderFactory = Arc::new(move |api_key: &str| {
            Box::new(Anthropic::with_timeout(
                api_key,
                anthropic.endpoint.clone(),
                Duration::from_secs(anthropic.timeout_secs),
            )) as Box<MessagesProvider>
        });

        let mut controller = Self::with_parts(config, fetcher, provider_factory);
        controller.env_api_key = std::env::var(API_KEY_ENV_VAR).ok();
        Ok(controller)
    }

    /// Create a controller from explicit collaborators; the environment is not consulted for keys
    pub fn with_parts(config: Config, fetcher: SubtitleFetcher, provider_factory: ProviderFactory) -> Self {
        let analyzer = StudyAnalyzer::from_config(&config.anthropic);
        Self {
            config,
            fetcher,
            analyzer,
            provider_factory,
            env_api_key: None,
        }
    }

    /// Check that `url` is an absolute http(s) URL and return it trimmed
    pub fn validate_url(url: &str) -> Result<String, AppError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::MissingUrl);
        }

        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(AppError::InvalidUrl(url.to_string()));
        }

        url::Url::parse(url).map_err(|e| AppError::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(url.to_string())
    }

    /// Fetch the transcript of a video without analyzing it
    pub async fn transcript(&self, url: &str) -> Result<FetchedSubtitles, AppError> {
        let url = Self::validate_url(url)?;
        let scratch = FileManager::scratch_dir().map_err(|e| AppError::File(format!("{:#}", e)))?;

        self.fetcher
            .fetch(&url, scratch.path())
            .await
            .ok_or(AppError::SubtitlesNotFound)
    }

    /// Run the whole workflow for one video
    pub async fn analyze(&self, url: &str, api_key: Option<&str>) -> Result<AnalysisReport, AppError> {
        let url = Self::validate_url(url)?;
        let api_key = self.config
            .resolve_api_key_with(self.env_api_key.as_deref(), api_key)
            .ok_or(AppError::MissingApiKey)?;

        // Removed together with every file the tool wrote, on every return path
        let scratch = FileManager::scratch_dir().map_err(|e| AppError::File(format!("{:#}", e)))?;

        let fetched = self.fetcher
            .fetch(&url, scratch.path())
            .await
            .ok_or(AppError::SubtitlesNotFound)?;

        if fetched.text.is_empty() {
            warn!("Subtitles for \"{}\" contain no dialogue", fetched.title);
            return Err(AppError::EmptyTranscript(fetched.title));
        }

        info!("Analyzing \"{}\" ({} characters)", fetched.title, fetched.text.chars().count());

        let provider = (self.provider_factory)(&api_key);
        let material = self.analyzer.analyze(provider.as_ref(), &fetched.text).await?;
        let nihongocards = NihongoCards::build(&fetched.title, &material);

        Ok(AnalysisReport {
            title: fetched.title,
            vocabulary: material.vocabulary,
            grammar: material.grammar,
            nihongocards,
        })
    }

    /// Write the report's card bundle into `output_dir`.
    ///
    /// Returns `None` when the file already exists and `force_overwrite` is off.
    pub fn save_cards(report: &AnalysisReport, output_dir: &Path, force_overwrite: bool) -> Result<Option<PathBuf>> {
        let output_path = FileManager::generate_output_path(output_dir, &report.title, CARDS_EXTENSION);

        if FileManager::file_exists(&output_path) && !force_overwrite {
            warn!("Skipping {:?}, file already exists (use -f to force overwrite)", output_path);
            return Ok(None);
        }

        let json = serde_json::to_string_pretty(&report.nihongocards)
            .context("Failed to serialize card bundle")?;
        FileManager::write_to_file(&output_path, &json)?;

        Ok(Some(output_path))
    }
}
