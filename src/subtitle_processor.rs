use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Context, Result};
use log::debug;

// @module: Subtitle normalization into a plain transcript

// @const: WebVTT file signature
const VTT_SIGNATURE: &str = "WEBVTT";

// @const: Byte order mark some editors write at the start of subtitle files
const BOM: char = '\u{feff}';

// @const: WebVTT timestamp range plus any trailing cue settings
static VTT_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\d{2,}:)?\d{2}:\d{2}\.\d{3}\s*-->\s*(?:\d{2,}:)?\d{2}:\d{2}\.\d{3}[^\n]*").unwrap()
});

// @const: SRT timestamp range
static SRT_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{2}:\d{2}:\d{2},\d{3}\s*-->\s*\d{2}:\d{2}:\d{2},\d{3}").unwrap()
});

// @const: Inline markup such as <c>, <i>, <00:00:01.000>
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>").unwrap()
});

// @const: Cue identifier lines
static CUE_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\d+$").unwrap()
});

/// Subtitle file formats understood by the normalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// Cue-based timed text (`.vtt`)
    WebVtt,
    /// Numbered captions (`.srt`)
    SubRip,
    /// Anything else; only line cleanup and dedup are applied
    Plain,
}

impl SubtitleFormat {
    /// Infer the format from a file extension (case-insensitive)
    pub fn from_extension(extension: &str) -> Self {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "vtt" => Self::WebVtt,
            "srt" => Self::SubRip,
            _ => Self::Plain,
        }
    }

    /// Infer the format from a path's extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        path.as_ref()
            .extension()
            .map(|ext| Self::from_extension(&ext.to_string_lossy()))
            .unwrap_or(Self::Plain)
    }

    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::WebVtt => "vtt",
            Self::SubRip => "srt",
            Self::Plain => "txt",
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for SubtitleFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Self::from_extension(s) {
            Self::Plain => Err(anyhow::anyhow!("Unsupported subtitle format: {}", s)),
            format => Ok(format),
        }
    }
}

/// Raw subtitle content together with its format
#[derive(Debug, Clone)]
pub struct SubtitleDocument {
    pub content: String,
    pub format: SubtitleFormat,
}

impl SubtitleDocument {
    /// Read a subtitle file, replacing invalid UTF-8 rather than failing
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;

        Ok(Self {
            content: String::from_utf8_lossy(&bytes).into_owned(),
            format: SubtitleFormat::from_path(path),
        })
    }

    /// Consume the document and produce its transcript
    pub fn normalize(self) -> NormalizedTranscript {
        normalize(&self.content, self.format)
    }
}

/// Ordered, deduplicated transcript lines
///
/// Lines are trimmed, never empty, and unique; they keep the order in
/// which they first appeared in the source document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTranscript {
    lines: Vec<String>,
}

impl NormalizedTranscript {
    /// Build a transcript from arbitrary lines, enforcing the invariants
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();

        for line in lines {
            let line = line.trim();
            if !line.is_empty() && seen.insert(line) {
                kept.push(line.to_string());
            }
        }

        Self { lines: kept }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines joined with a single newline
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for NormalizedTranscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Strip timing and markup from raw subtitle content and deduplicate the remaining lines.
///
/// Never fails: text that matches none of the stripping rules is kept as
/// transcript text.
pub fn normalize(content: &str, format: SubtitleFormat) -> NormalizedTranscript {
    let content = content.replace("\r\n", "\n");
    let content = content.strip_prefix(BOM).unwrap_or(&content);

    let stripped = match format {
        SubtitleFormat::WebVtt => {
            let text = strip_vtt_header(content);
            let text = VTT_TIMESTAMP_REGEX.replace_all(&text, "");
            let text = TAG_REGEX.replace_all(&text, "");
            CUE_ID_REGEX.replace_all(&text, "").into_owned()
        },
        SubtitleFormat::SubRip => {
            let text = SRT_TIMESTAMP_REGEX.replace_all(content, "");
            let text = CUE_ID_REGEX.replace_all(&text, "");
            TAG_REGEX.replace_all(&text, "").into_owned()
        },
        SubtitleFormat::Plain => content.to_string(),
    };

    let transcript = NormalizedTranscript::from_lines(stripped.lines());
    debug!("Normalized {} subtitle into {} unique lines", format, transcript.len());
    transcript
}

/// Remove the WebVTT header block following the first `WEBVTT` signature.
///
/// The block ends at the first blank line, which is removed with it, or
/// just before the first timing line, whichever comes first. Without
/// either, the rest of the input is header.
fn strip_vtt_header(content: &str) -> String {
    let Some(start) = content.find(VTT_SIGNATURE) else {
        return content.to_string();
    };

    let mut end = content.len();
    let mut offset = start;
    for (index, line) in content[start..].split_inclusive('\n').enumerate() {
        if index > 0 && line.contains("-->") {
            end = offset;
            break;
        }

        offset += line.len();
        if index > 0 && line.trim().is_empty() {
            end = offset;
            break;
        }
    }

    format!("{}{}", &content[..start], &content[end..])
}

/// Read and normalize a subtitle file, inferring its format from the extension
pub fn parse_subtitle_file<P: AsRef<Path>>(path: P) -> Result<NormalizedTranscript> {
    Ok(SubtitleDocument::from_file(path)?.normalize())
}
