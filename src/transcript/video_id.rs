//! YouTube video id extraction

use once_cell::sync::Lazy;
use regex::Regex;

/// A bare 11-character video id
static BARE_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("Invalid video id regex"));

/// Scheme-optional URL whose host is a YouTube domain or subdomain
static YOUTUBE_HOST_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:https?://)?(?:[a-z0-9-]+\.)*(?:youtube\.com|youtube-nocookie\.com|youtu\.be)(?::\d+)?(?:[/?#]|$)")
        .expect("Invalid YouTube host regex")
});

/// Video id inside a watch, short, embed, legacy, shorts or live URL
static URL_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[?&]v=|youtu\.be/|/embed/|/v/|/shorts/|/live/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)")
        .expect("Invalid video URL regex")
});

/// Extract the video id from a YouTube URL or return a bare id unchanged
///
/// Supports:
/// - `dQw4w9WgXcQ`
/// - `https://www.youtube.com/watch?v=dQw4w9WgXcQ`
/// - `https://youtu.be/dQw4w9WgXcQ`
/// - `https://www.youtube.com/embed/dQw4w9WgXcQ`
/// - `https://www.youtube.com/v/dQw4w9WgXcQ`
/// - `https://www.youtube.com/shorts/dQw4w9WgXcQ`
/// - `https://www.youtube.com/live/dQw4w9WgXcQ`
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if BARE_ID_REGEX.is_match(input) {
        return Some(input.to_string());
    }

    if !is_youtube_domain(input) {
        return None;
    }

    URL_ID_REGEX
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn is_youtube_domain(url: &str) -> bool {
    YOUTUBE_HOST_REGEX.is_match(url)
}
