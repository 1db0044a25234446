/*!
 * Common test utilities for the animejp test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use animejp::app_config::Config;
use animejp::app_controller::Controller;
use animejp::errors::ToolError;
use animejp::fetcher::{FetchStrategy, SubtitleFetcher, SubtitleTool};
use animejp::providers::{MessagesProvider, ProviderFactory};
use animejp::providers::mock::MockProvider;
use animejp::subtitle_processor::SubtitleFormat;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A short WebVTT file as yt-dlp writes it for auto-generated captions
pub const SAMPLE_VTT: &str = "WEBVTT
Kind: captions
Language: ja

00:00:01.000 --> 00:00:03.000 align:start position:0%
<c>お前</c>の<00:00:01.500><c>名前は</c>

00:00:03.000 --> 00:00:05.000
お前の名前は

00:00:05.000 --> 00:00:07.000
覚悟はできている
";

/// A short SRT file with a repeated caption
pub const SAMPLE_SRT: &str = "1
00:00:01,000 --> 00:00:04,000
<i>行くぞ</i>

2
00:00:05,000 --> 00:00:09,000
待って！

3
00:00:10,000 --> 00:00:14,000
行くぞ
";

/// A valid model answer with one item per table
pub const SAMPLE_ANSWER: &str = r#"```json
{
  "vocabulary": [
    {"japanese": "覚悟", "reading": "かくご", "chinese": "決心", "notes": "N2"}
  ],
  "grammar": [
    {"japanese": "〜ている", "reading": "", "chinese": "表示狀態", "notes": "覚悟はできている"}
  ]
}
```"#;

/// Stand-in for yt-dlp: records every call and writes a subtitle file on chosen strategies
#[derive(Debug, Clone)]
pub struct ScriptedTool {
    /// Strategy ranks that produce a file
    succeed_on: Vec<u8>,
    /// File name written into the scratch directory
    file_name: String,
    /// Content of the written file
    content: String,
    /// Ranks that fail with a tool error instead of running
    fail_on: Vec<u8>,
    calls: Arc<Mutex<Vec<FetchStrategy>>>,
}

impl ScriptedTool {
    /// A tool that never produces anything
    pub fn silent() -> Self {
        Self {
            succeed_on: Vec::new(),
            file_name: String::new(),
            content: String::new(),
            fail_on: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A tool that writes `file_name` with `content` when run for strategy `rank`
    pub fn producing_on(rank: u8, file_name: &str, content: &str) -> Self {
        Self {
            succeed_on: vec![rank],
            file_name: file_name.to_string(),
            content: content.to_string(),
            ..Self::silent()
        }
    }

    /// Make the given ranks fail with a tool error
    pub fn failing_on(mut self, ranks: &[u8]) -> Self {
        self.fail_on = ranks.to_vec();
        self
    }

    /// Ranks of the strategies run so far, in call order
    pub fn called_ranks(&self) -> Vec<u8> {
        self.calls.lock().unwrap().iter().map(|s| s.rank).collect()
    }
}

#[async_trait]
impl SubtitleTool for ScriptedTool {
    async fn retrieve(&self, _url: &str, strategy: &FetchStrategy, scratch_dir: &Path) -> Result<(), ToolError> {
        self.calls.lock().unwrap().push(*strategy);

        if self.fail_on.contains(&strategy.rank) {
            return Err(ToolError::Io(std::io::Error::other("scripted failure")));
        }

        if self.succeed_on.contains(&strategy.rank) {
            fs::write(scratch_dir.join(&self.file_name), &self.content)?;
        }

        Ok(())
    }
}

/// A fetcher over `tool` looking for `.vtt` files
pub fn vtt_fetcher(tool: &ScriptedTool) -> SubtitleFetcher {
    SubtitleFetcher::new(Arc::new(tool.clone()), SubtitleFormat::WebVtt)
}

/// Provider factory handing out clones of `provider` and recording the keys it was given
pub fn mock_factory(provider: &MockProvider, keys: Arc<Mutex<Vec<String>>>) -> ProviderFactory {
    let provider = provider.clone();
    Arc::new(move |api_key: &str| {
        keys.lock().unwrap().push(api_key.to_string());
        Box::new(provider.clone()) as Box<MessagesProvider>
    })
}

/// Controller over a scripted tool and mock provider, with `config_key` as the configured API key
pub fn test_controller(tool: &ScriptedTool, provider: &MockProvider, config_key: &str) -> Controller {
    let mut config = Config::default();
    config.anthropic.api_key = config_key.to_string();

    let keys = Arc::new(Mutex::new(Vec::new()));
    Controller::with_parts(config, vtt_fetcher(tool), mock_factory(provider, keys))
}
