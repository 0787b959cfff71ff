//! Transcript data models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the caption track was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranscriptType {
    AutoGenerated,
    Manual,
}

impl TranscriptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptType::AutoGenerated => "auto-generated",
            TranscriptType::Manual => "manual",
        }
    }
}

impl fmt::Display for TranscriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranscriptType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto-generated" => Ok(TranscriptType::AutoGenerated),
            "manual" => Ok(TranscriptType::Manual),
            other => Err(anyhow::anyhow!("unknown transcript type: {}", other)),
        }
    }
}

/// A fetched transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub video_id: String,
    /// Language code of the caption track, e.g. `en`
    pub language: String,
    pub transcript_type: TranscriptType,
    /// Seconds from the start of the video to the end of the last caption
    pub duration: f64,
    pub transcript: String,
}

impl TranscriptResult {
    /// First `max_chars` characters of the transcript text
    pub fn preview(&self, max_chars: usize) -> &str {
        truncate_chars(&self.transcript, max_chars)
    }
}

/// Cut `s` to at most `max_chars` characters on a char boundary
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_type_strings() {
        assert_eq!(TranscriptType::AutoGenerated.to_string(), "auto-generated");
        assert_eq!(TranscriptType::Manual.to_string(), "manual");
        assert_eq!(
            "auto-generated".parse::<TranscriptType>().unwrap(),
            TranscriptType::AutoGenerated
        );
        assert!("generated".parse::<TranscriptType>().is_err());
    }

    #[test]
    fn test_transcript_type_serde() {
        let json = serde_json::to_string(&TranscriptType::AutoGenerated).unwrap();
        assert_eq!(json, "\"auto-generated\"");
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let result = TranscriptResult {
            video_id: "dQw4w9WgXcQ".to_string(),
            language: "ja".to_string(),
            transcript_type: TranscriptType::Manual,
            duration: 12.5,
            transcript: "こんにちは世界".to_string(),
        };
        assert_eq!(result.preview(5), "こんにちは");
        assert_eq!(result.preview(100), "こんにちは世界");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }
}
