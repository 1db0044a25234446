/*!
 * Study material extraction.
 *
 * Sends a transcript to the model with a fixed prompt and parses the JSON
 * answer into vocabulary and grammar items.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::app_config::AnthropicConfig;
use crate::errors::AnalysisError;
use crate::providers::MessagesProvider;
use crate::providers::anthropic::AnthropicRequest;

/// System prompt for the study extraction
pub const SYSTEM_PROMPT: &str = r#"你是日文學習助手，專門從日本動漫對白中選取適合 N2 程度以上的學習素材。

請從以下動漫字幕中：
1. 選出 20 個 N2 以上程度的重要單字（避免太基礎的 N5/N4 單字）
2. 選出 10 個包含重要文法的例句（N2 以上文法，如 〜にもかかわらず、〜に際して、〜を踏まえて 等）

要求：
- 單字需提供假名讀音和繁體中文翻譯
- 例句直接從字幕原文擷取（不要改寫）
- 翻譯使用繁體中文
- 以 JSON 格式回傳，格式如下：

{
  "vocabulary": [
    {"japanese": "単語", "reading": "たんご", "chinese": "單字", "notes": "名詞/動詞/形容詞等說明"}
  ],
  "grammar": [
    {"japanese": "例句原文", "reading": "", "chinese": "繁體中文翻譯", "notes": "文法重點：〜文法型"}
  ]
}

只回傳 JSON，不要其他文字。"#;

/// Prefix of the user message; the transcript follows it
pub const USER_PROMPT_PREFIX: &str = "以下是動漫字幕內容：\n\n";

/// Appended to transcripts that were cut short
pub const TRUNCATION_MARKER: &str = "\n...(字幕截斷)";

// @const: Leading ``` or ```json fence
static LEADING_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^```(?:json)?\s*").unwrap()
});

// @const: Trailing ``` fence
static TRAILING_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*```$").unwrap()
});

/// One vocabulary word or grammar example
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyItem {
    #[serde(default)]
    pub japanese: String,
    #[serde(default)]
    pub reading: String,
    #[serde(default)]
    pub chinese: String,
    #[serde(default)]
    pub notes: String,
}

/// Parsed model answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyMaterial {
    #[serde(default)]
    pub vocabulary: Vec<StudyItem>,
    #[serde(default)]
    pub grammar: Vec<StudyItem>,
}

/// Builds study requests and interprets the answers
#[derive(Debug, Clone)]
pub struct StudyAnalyzer {
    model: String,
    max_tokens: u32,
    max_transcript_chars: usize,
}

impl StudyAnalyzer {
    pub fn new(model: impl Into<String>, max_tokens: u32, max_transcript_chars: usize) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            max_transcript_chars,
        }
    }

    pub fn from_config(config: &AnthropicConfig) -> Self {
        Self::new(config.model.clone(), config.max_tokens, config.max_transcript_chars)
    }

    /// Ask the provider for study material from `transcript`
    pub async fn analyze(&self, provider: &MessagesProvider, transcript: &str) -> Result<StudyMaterial, AnalysisError> {
        let request = self.build_request(transcript);
        let response = provider.complete(request).await?;

        let material = Self::parse_response(&response.text())?;
        debug!(
            "Model returned {} vocabulary items and {} grammar items",
            material.vocabulary.len(),
            material.grammar.len()
        );

        Ok(material)
    }

    /// Request carrying the system prompt and the (possibly truncated) transcript
    pub fn build_request(&self, transcript: &str) -> AnthropicRequest {
        let transcript = truncate_transcript(transcript, self.max_transcript_chars);

        AnthropicRequest::new(self.model.clone(), self.max_tokens)
            .system(SYSTEM_PROMPT)
            .add_message("user", format!("{}{}", USER_PROMPT_PREFIX, transcript))
    }

    /// Parse the model's answer, tolerating a surrounding Markdown code fence
    pub fn parse_response(text: &str) -> Result<StudyMaterial, AnalysisError> {
        let text = text.trim();
        let text = LEADING_FENCE_REGEX.replace(text, "");
        let text = TRAILING_FENCE_REGEX.replace(&text, "");

        serde_json::from_str(&text).map_err(|e| {
            warn!("Model response is not valid JSON: {}", e);
            AnalysisError::InvalidJson(e)
        })
    }
}

/// Cut `transcript` to at most `max_chars` characters, marking the cut
pub fn truncate_transcript(transcript: &str, max_chars: usize) -> String {
    match transcript.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            debug!("Truncating transcript to {} characters", max_chars);
            format!("{}{}", &transcript[..byte_index], TRUNCATION_MARKER)
        },
        None => transcript.to_string(),
    }
}
