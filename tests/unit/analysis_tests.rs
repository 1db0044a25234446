/*!
 * Tests for study analysis and card export
 */

use anyhow::Result;
use chrono::{TimeZone, Utc};
use animejp::analysis::{StudyAnalyzer, TRUNCATION_MARKER, USER_PROMPT_PREFIX};
use animejp::cards::{BookType, NihongoCards};
use animejp::errors::{AnalysisError, ProviderError};
use animejp::providers::mock::{MockFailure, MockProvider};
use crate::common;

/// Test that a fenced answer is parsed into both tables
#[tokio::test]
async fn test_analyze_withFencedAnswer_shouldReturnMaterial() -> Result<()> {
    let provider = MockProvider::replying(common::SAMPLE_ANSWER);
    let analyzer = StudyAnalyzer::new("claude-test", 1024, 8000);

    let material = analyzer.analyze(&provider, "覚悟はできている").await?;

    assert_eq!(material.vocabulary[0].japanese, "覚悟");
    assert_eq!(material.grammar[0].chinese, "表示狀態");
    assert_eq!(provider.request_count(), 1);
    assert_eq!(provider.last_prompt().unwrap(), format!("{}覚悟はできている", USER_PROMPT_PREFIX));
    Ok(())
}

/// Test that long transcripts are cut before being sent
#[tokio::test]
async fn test_analyze_withLongTranscript_shouldSendTruncatedPrompt() -> Result<()> {
    let provider = MockProvider::replying("{}");
    let analyzer = StudyAnalyzer::new("claude-test", 1024, 3);

    let material = analyzer.analyze(&provider, "あいうえお").await?;

    assert!(material.vocabulary.is_empty());
    assert_eq!(
        provider.last_prompt().unwrap(),
        format!("{}あいう{}", USER_PROMPT_PREFIX, TRUNCATION_MARKER)
    );
    Ok(())
}

/// Test that provider failures surface unchanged
#[tokio::test]
async fn test_analyze_withRateLimit_shouldReturnProviderError() {
    let provider = MockProvider::failing(MockFailure::RateLimit);
    let analyzer = StudyAnalyzer::new("claude-test", 1024, 8000);

    let result = analyzer.analyze(&provider, "字幕").await;

    assert!(matches!(result, Err(AnalysisError::Provider(ProviderError::RateLimitExceeded(_)))));
}

/// Test that a non-JSON answer is an analysis error
#[tokio::test]
async fn test_analyze_withProseAnswer_shouldReturnInvalidJson() {
    let provider = MockProvider::replying("I could not find anything.");
    let analyzer = StudyAnalyzer::new("claude-test", 1024, 8000);

    let result = analyzer.analyze(&provider, "字幕").await;

    assert!(matches!(result, Err(AnalysisError::InvalidJson(_))));
}

/// Test the exported bundle layout
#[test]
fn test_nihongoCards_build_at_shouldProduceGroupWithTwoTables() -> Result<()> {
    let material = StudyAnalyzer::parse_response(common::SAMPLE_ANSWER)?;
    let exported_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();

    let cards = NihongoCards::build_at("フリーレン", &material, exported_at);
    let json = serde_json::to_value(&cards)?;

    assert_eq!(json["type"], "group");
    assert_eq!(json["version"], 1);
    assert_eq!(json["title"], "AnimeJapanese - フリーレン");
    assert_eq!(json["exportedAt"], "2024-05-01T12:30:00Z");
    assert_eq!(json["tables"][0]["bookType"], "vocabulary");
    assert_eq!(json["tables"][1]["bookType"], "grammar");
    assert_eq!(cards.table(BookType::Grammar).unwrap().items.len(), 1);
    Ok(())
}
