/*!
 * Subtitle acquisition.
 *
 * Runs the external retrieval tool once per fetch strategy, in priority
 * order, and hands the first subtitle file it leaves behind to the
 * normalizer. Tool failures are absorbed per attempt; the only outcome a
 * caller sees is either a transcript or `None`.
 */

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::process::Command;

use crate::app_config::FetcherConfig;
use crate::errors::ToolError;
use crate::file_utils::FileManager;
use crate::subtitle_processor::{SubtitleDocument, SubtitleFormat};

/// Which caption track(s) the retrieval tool is asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionSource {
    /// Captions uploaded by the content owner
    Official,
    /// Captions produced by the platform's speech recognition
    AutoGenerated,
    /// Both of the above in a single request
    Combined,
}

impl CaptionSource {
    /// Tool flags selecting this source
    pub fn tool_flags(&self) -> &'static [&'static str] {
        match self {
            Self::Official => &["--write-sub"],
            Self::AutoGenerated => &["--write-auto-sub"],
            Self::Combined => &["--write-sub", "--write-auto-sub"],
        }
    }
}

impl fmt::Display for CaptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Official => "official",
            Self::AutoGenerated => "auto-generated",
            Self::Combined => "official+auto-generated",
        };
        write!(f, "{}", name)
    }
}

/// One entry of the fallback order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchStrategy {
    /// 1 is tried first
    pub rank: u8,
    pub source: CaptionSource,
}

/// Strategies in the order they are tried.
///
/// Official captions come first; the combined request is the widest net
/// and goes last.
pub const FETCH_STRATEGIES: [FetchStrategy; 3] = [
    FetchStrategy { rank: 1, source: CaptionSource::Official },
    FetchStrategy { rank: 2, source: CaptionSource::AutoGenerated },
    FetchStrategy { rank: 3, source: CaptionSource::Combined },
];

/// Outcome of running one strategy
#[derive(Debug)]
pub struct FetchAttempt {
    pub strategy: FetchStrategy,
    /// Subtitle file found in the scratch directory afterwards
    pub subtitle_file: Option<PathBuf>,
    /// Tool failure, kept for logging only
    pub tool_error: Option<ToolError>,
}

impl FetchAttempt {
    pub fn produced_file(&self) -> bool {
        self.subtitle_file.is_some()
    }
}

/// A transcript obtained by the fetcher
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedSubtitles {
    /// Normalized transcript, lines joined with `\n`; may be empty
    pub text: String,
    /// Title derived from the subtitle file name
    pub title: String,
    /// Caption source of the strategy that succeeded
    pub source: CaptionSource,
    /// Subtitle file the transcript was read from
    pub path: PathBuf,
}

/// External program that writes subtitle files into a directory
#[async_trait]
pub trait SubtitleTool: Send + Sync {
    /// Run the tool once for `strategy`, writing any subtitle file into `scratch_dir`.
    ///
    /// Success of the call says nothing about whether a file was produced.
    async fn retrieve(&self, url: &str, strategy: &FetchStrategy, scratch_dir: &Path) -> Result<(), ToolError>;
}

/// yt-dlp invoked as a subprocess
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    program_args: Vec<String>,
    sub_lang: String,
    format: SubtitleFormat,
    cookies_from_browser: Option<String>,
    extra_args: Vec<String>,
    timeout: Duration,
}

impl YtDlp {
    pub fn from_config(config: &FetcherConfig) -> Result<Self> {
        Ok(Self {
            program: config.program.clone(),
            program_args: config.program_args.clone(),
            sub_lang: config.sub_lang.clone(),
            format: config.subtitle_format()?,
            cookies_from_browser: config.cookies_from_browser.clone(),
            extra_args: config.extra_args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Override the per-attempt time budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Format the tool is asked to convert subtitles to
    pub fn format(&self) -> SubtitleFormat {
        self.format
    }

    /// Full argument list for one strategy, excluding the program itself
    pub fn build_args(&self, url: &str, strategy: &FetchStrategy, scratch_dir: &Path) -> Vec<String> {
        // The title template makes the subtitle file name carry the video title
        let output_template = scratch_dir.join("%(title)s");

        let mut args = self.program_args.clone();
        args.extend([
            "--skip-download".to_string(),
            "--sub-lang".to_string(),
            self.sub_lang.clone(),
            "--convert-subs".to_string(),
            self.format.extension().to_string(),
            "-o".to_string(),
            output_template.to_string_lossy().into_owned(),
            "--no-warnings".to_string(),
        ]);

        if let Some(browser) = &self.cookies_from_browser {
            args.push("--cookies-from-browser".to_string());
            args.push(browser.clone());
        }

        args.extend(self.extra_args.iter().cloned());
        args.extend(strategy.source.tool_flags().iter().map(|flag| flag.to_string()));
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl SubtitleTool for YtDlp {
    async fn retrieve(&self, url: &str, strategy: &FetchStrategy, scratch_dir: &Path) -> Result<(), ToolError> {
        let args = self.build_args(url, strategy, scratch_dir);
        debug!("Running {} {}", self.program, args.join(" "));

        let child = Command::new(&self.program)
            .args(&args)
            .current_dir(scratch_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Dropping the child on timeout kills it
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ToolError::Timeout(self.timeout))??;

        debug!(
            "{} finished with {} ({} bytes of diagnostics)",
            self.program,
            output.status,
            output.stderr.len()
        );

        Ok(())
    }
}

/// Derive a video title from a subtitle file name.
///
/// The last dot-separated part of the stem (the language tag in
/// `Title.ja.vtt`) is dropped; a stem without a dot is used whole.
pub fn title_from_path<P: AsRef<Path>>(path: P) -> String {
    let stem = path.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match stem.rsplit_once('.') {
        Some((title, _suffix)) => title.to_string(),
        None => stem,
    }
}

/// Tries each fetch strategy in order until one yields a subtitle file
pub struct SubtitleFetcher {
    tool: Arc<dyn SubtitleTool>,
    format: SubtitleFormat,
}

impl SubtitleFetcher {
    /// `format` is the extension looked for in the scratch directory
    pub fn new(tool: Arc<dyn SubtitleTool>, format: SubtitleFormat) -> Self {
        Self { tool, format }
    }

    pub fn from_config(config: &FetcherConfig) -> Result<Self> {
        let tool = YtDlp::from_config(config)?;
        let format = tool.format();
        Ok(Self::new(Arc::new(tool), format))
    }

    /// Fetch and normalize subtitles for `url`.
    ///
    /// `scratch_dir` is shared by every attempt and left in place; the
    /// caller owns its lifetime. Returns `None` once all strategies have
    /// come back without a subtitle file.
    pub async fn fetch(&self, url: &str, scratch_dir: &Path) -> Option<FetchedSubtitles> {
        for strategy in FETCH_STRATEGIES.iter() {
            let attempt = self.attempt(url, strategy, scratch_dir).await;

            let Some(path) = attempt.subtitle_file else {
                continue;
            };

            match SubtitleDocument::from_file(&path) {
                Ok(document) => {
                    let transcript = document.normalize();
                    let title = title_from_path(&path);
                    info!(
                        "Found {} subtitles for \"{}\" ({} lines)",
                        strategy.source,
                        title,
                        transcript.len()
                    );

                    return Some(FetchedSubtitles {
                        text: transcript.text(),
                        title,
                        source: strategy.source,
                        path,
                    });
                },
                Err(e) => {
                    warn!("Could not read subtitle file {}: {:#}", path.display(), e);
                },
            }
        }

        info!("No subtitles found for {} after {} strategies", url, FETCH_STRATEGIES.len());
        None
    }

    /// Run one strategy and look for its output
    async fn attempt(&self, url: &str, strategy: &FetchStrategy, scratch_dir: &Path) -> FetchAttempt {
        debug!("Trying strategy {} ({} captions)", strategy.rank, strategy.source);

        let tool_error = self.tool.retrieve(url, strategy, scratch_dir).await.err();
        if let Some(e) = &tool_error {
            warn!("Subtitle tool failed for {} captions: {}", strategy.source, e);
        }

        let attempt = FetchAttempt {
            strategy: *strategy,
            subtitle_file: self.find_subtitle_file(scratch_dir),
            tool_error,
        };

        if !attempt.produced_file() {
            debug!("Strategy {} produced no .{} file", strategy.rank, self.format);
        }

        attempt
    }

    fn find_subtitle_file(&self, scratch_dir: &Path) -> Option<PathBuf> {
        match FileManager::find_files(scratch_dir, self.format.extension()) {
            Ok(files) => files.into_iter().next(),
            Err(e) => {
                warn!("Could not scan {}: {:#}", scratch_dir.display(), e);
                None
            },
        }
    }
}
