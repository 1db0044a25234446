/*!
 * Tests for the fetch strategy fallback
 */

use anyhow::Result;
use animejp::fetcher::{title_from_path, CaptionSource};
use crate::common::{self, ScriptedTool};

/// Test that a hit on the second strategy stops after two invocations
#[tokio::test]
async fn test_fetch_withAutoCaptionsOnly_shouldStopAfterSecondStrategy() -> Result<()> {
    let scratch = common::create_temp_dir()?;
    let tool = ScriptedTool::producing_on(2, "Frieren 29.ja.vtt", common::SAMPLE_VTT);

    let fetched = common::vtt_fetcher(&tool)
        .fetch("https://www.youtube.com/watch?v=abc", scratch.path())
        .await
        .expect("subtitles should be found");

    assert_eq!(tool.called_ranks(), [1, 2]);
    assert_eq!(fetched.source, CaptionSource::AutoGenerated);
    assert_eq!(fetched.title, "Frieren 29");
    assert_eq!(fetched.text, "お前の名前は\n覚悟はできている");
    Ok(())
}

/// Test that official captions win without trying the other strategies
#[tokio::test]
async fn test_fetch_withOfficialCaptions_shouldRunOnce() -> Result<()> {
    let scratch = common::create_temp_dir()?;
    let tool = ScriptedTool::producing_on(1, "Title.ja.vtt", common::SAMPLE_VTT);

    let fetched = common::vtt_fetcher(&tool).fetch("https://example.com/v", scratch.path()).await;

    assert_eq!(tool.called_ranks(), [1]);
    assert_eq!(fetched.map(|f| f.source), Some(CaptionSource::Official));
    Ok(())
}

/// Test that all three strategies run, in order, before giving up
#[tokio::test]
async fn test_fetch_withNoCaptions_shouldTryAllStrategiesAndReturnNone() -> Result<()> {
    let scratch = common::create_temp_dir()?;
    let tool = ScriptedTool::silent();

    let fetched = common::vtt_fetcher(&tool).fetch("https://example.com/v", scratch.path()).await;

    assert!(fetched.is_none());
    assert_eq!(tool.called_ranks(), [1, 2, 3]);
    Ok(())
}

/// Test that a failing tool run counts as an attempt without a file
#[tokio::test]
async fn test_fetch_withToolErrors_shouldFallThroughToNextStrategy() -> Result<()> {
    let scratch = common::create_temp_dir()?;
    let tool = ScriptedTool::producing_on(3, "Title.ja.vtt", common::SAMPLE_VTT).failing_on(&[1, 2]);

    let fetched = common::vtt_fetcher(&tool).fetch("https://example.com/v", scratch.path()).await;

    assert_eq!(tool.called_ranks(), [1, 2, 3]);
    assert_eq!(fetched.map(|f| f.source), Some(CaptionSource::Combined));
    Ok(())
}

/// Test that an empty subtitle file is still a successful fetch
#[tokio::test]
async fn test_fetch_withEmptySubtitleFile_shouldReturnEmptyText() -> Result<()> {
    let scratch = common::create_temp_dir()?;
    let tool = ScriptedTool::producing_on(1, "Quiet.ja.vtt", "WEBVTT\n\n");

    let fetched = common::vtt_fetcher(&tool)
        .fetch("https://example.com/v", scratch.path())
        .await
        .expect("an empty file is still a file");

    assert_eq!(fetched.text, "");
    assert_eq!(fetched.title, "Quiet");
    assert_eq!(tool.called_ranks(), [1]);
    Ok(())
}

/// Test that files of another format are not picked up
#[tokio::test]
async fn test_fetch_withOnlySrtProduced_shouldIgnoreIt() -> Result<()> {
    let scratch = common::create_temp_dir()?;
    let tool = ScriptedTool::producing_on(1, "Title.ja.srt", common::SAMPLE_SRT);

    let fetched = common::vtt_fetcher(&tool).fetch("https://example.com/v", scratch.path()).await;

    assert!(fetched.is_none());
    assert_eq!(tool.called_ranks(), [1, 2, 3]);
    Ok(())
}

/// Test that several candidate files resolve to the first by name
#[tokio::test]
async fn test_fetch_withSeveralVttFiles_shouldPickFirstSorted() -> Result<()> {
    let scratch = common::create_temp_dir()?;
    common::create_test_file(scratch.path(), "B.ja.vtt", "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nびー\n")?;
    common::create_test_file(scratch.path(), "A.ja.vtt", "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nえー\n")?;
    let tool = ScriptedTool::silent();

    let fetched = common::vtt_fetcher(&tool)
        .fetch("https://example.com/v", scratch.path())
        .await
        .expect("pre-existing file should be found");

    assert_eq!(fetched.title, "A");
    assert_eq!(fetched.text, "えー");
    Ok(())
}

/// Test title derivation for the file names yt-dlp produces
#[test]
fn test_titleFromPath_withToolFileNames_shouldStripLanguageAndExtension() {
    assert_eq!(title_from_path("/tmp/scratch/Title.ja.vtt"), "Title");
    assert_eq!(title_from_path("【MAD】 Opening v2.ja.vtt"), "【MAD】 Opening v2");
    assert_eq!(title_from_path("Plain.vtt"), "Plain");
}
