//! Transcript fetching from YouTube caption tracks
//!
//! The fetcher scrapes the watch page for the caption track list, picks the
//! best track for the requested languages, then downloads and flattens the
//! timed-text XML.

use crate::error::FetchError;
use crate::proxy::ProxyConfig;
use crate::transcript::models::{TranscriptResult, TranscriptType};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE};
use reqwest::{Client, Proxy as ReqwestProxy, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Default timeout for each HTTP request in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent for HTTP requests
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default Accept-Language header
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US";

/// Default site the watch pages are requested from
const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

static CONSENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name="v" value="(.*?)""#).expect("Invalid consent regex"));

static TEXT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<text start="([\d.]+)"(?: dur="([\d.]+)")?[^>]*>(.*?)</text>"#)
        .expect("Invalid timed-text regex")
});

static ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+|#x[0-9a-fA-F]+|amp|lt|gt|quot|apos);").expect("Invalid entity regex")
});

static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"));

/// Source of transcripts for a video
///
/// `Ok(None)` means the request went through but no transcript exists for the
/// requested languages.
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    async fn fetch_transcript(
        &self,
        video_id: &str,
        languages: &[String],
        proxy: Option<&ProxyConfig>,
    ) -> Result<Option<TranscriptResult>, FetchError>;
}

/// Configuration for the YouTube fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Timeout for each HTTP request
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: String,
    /// Accept-Language header sent with every request
    pub accept_language: String,
    /// Scheme and host watch pages are requested from
    pub base_url: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl FetcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_accept_language(mut self, accept_language: String) -> Self {
        self.accept_language = accept_language;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

/// Caption track advertised on the watch page
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn transcript_type(&self) -> TranscriptType {
        match self.kind.as_deref() {
            Some("asr") => TranscriptType::AutoGenerated,
            _ => TranscriptType::Manual,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionsJson {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

/// One timed caption line
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

/// Fetcher that talks to youtube.com directly
#[derive(Debug, Clone, Default)]
pub struct YouTubeTranscriptFetcher {
    config: FetcherConfig,
}

impl YouTubeTranscriptFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FetcherConfig) -> Self {
        Self { config }
    }

    /// Create a reqwest client routed through the proxy, if any
    fn create_client(&self, proxy: Option<&ProxyConfig>) -> Result<Client, FetchError> {
        let mut builder = Client::builder()
            .timeout(self.config.timeout)
            .user_agent(&self.config.user_agent);

        if let Some(proxy) = proxy {
            builder = builder
                .proxy(ReqwestProxy::http(&proxy.http_url)?)
                .proxy(ReqwestProxy::https(&proxy.https_url)?);
        }

        Ok(builder.build()?)
    }

    async fn get_text(
        &self,
        client: &Client,
        url: &str,
        cookie: Option<&str>,
    ) -> Result<String, FetchError> {
        let mut request = client
            .get(url)
            .header(ACCEPT_LANGUAGE, self.config.accept_language.as_str());
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RequestBlocked(
                "HTTP 429 Too Many Requests".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    async fn fetch_watch_html(&self, client: &Client, video_id: &str) -> Result<String, FetchError> {
        let url = format!(
            "{}/watch?v={}",
            self.config.base_url.trim_end_matches('/'),
            video_id
        );
        let html = self.get_text(client, &url, None).await?;

        let Some(consent) = consent_value(&html) else {
            return Ok(html);
        };

        tracing::debug!(video_id, "answering consent page");
        let cookie = format!("CONSENT=YES+{}", consent);
        let html = self.get_text(client, &url, Some(&cookie)).await?;
        if consent_value(&html).is_some() {
            return Err(FetchError::InvalidResponse(
                "consent cookie was not accepted".to_string(),
            ));
        }
        Ok(html)
    }
}

#[async_trait]
impl TranscriptFetcher for YouTubeTranscriptFetcher {
    async fn fetch_transcript(
        &self,
        video_id: &str,
        languages: &[String],
        proxy: Option<&ProxyConfig>,
    ) -> Result<Option<TranscriptResult>, FetchError> {
        let client = self.create_client(proxy)?;

        let html = self.fetch_watch_html(&client, video_id).await?;
        let tracks = extract_caption_tracks(&html)?;
        tracing::debug!(video_id, tracks = tracks.len(), "found caption tracks");

        let Some(track) = select_track(&tracks, languages) else {
            return Ok(None);
        };

        let url = track.base_url.replace("&fmt=srv3", "");
        let xml = self.get_text(&client, &url, None).await?;
        let segments = parse_timed_text(&xml);
        let Some(last) = segments.last() else {
            return Ok(None);
        };

        let duration = last.start + last.duration;
        let transcript = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Some(TranscriptResult {
            video_id: video_id.to_string(),
            language: track.language_code.clone(),
            transcript_type: track.transcript_type(),
            duration,
            transcript,
        }))
    }
}

/// Value of the consent form's `v` field when YouTube served a consent page
fn consent_value(html: &str) -> Option<&str> {
    if !html.contains("action=\"https://consent.youtube.com/s\"") {
        return None;
    }
    CONSENT_REGEX
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Pull the caption track list out of a watch page
///
/// Pages without a `"captions"` block yield an empty list.
pub fn extract_caption_tracks(html: &str) -> Result<Vec<CaptionTrack>, FetchError> {
    if html.contains("class=\"g-recaptcha\"") {
        return Err(FetchError::RequestBlocked("reCAPTCHA challenge".to_string()));
    }

    let Some((_, rest)) = html.split_once("\"captions\":") else {
        return Ok(Vec::new());
    };
    let Some((json, _)) = rest.split_once(",\"videoDetails") else {
        return Err(FetchError::InvalidResponse(
            "unterminated captions block".to_string(),
        ));
    };

    let captions: CaptionsJson = serde_json::from_str(json)
        .map_err(|e| FetchError::InvalidResponse(format!("captions json: {}", e)))?;

    Ok(captions
        .player_captions_tracklist_renderer
        .map(|r| r.caption_tracks)
        .unwrap_or_default())
}

/// Pick a track for the first language that has one, manual before generated
pub fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|lang| {
        tracks
            .iter()
            .filter(|t| &t.language_code == lang)
            .min_by_key(|t| t.transcript_type() == TranscriptType::AutoGenerated)
    })
}

/// Parse timed-text XML into non-empty caption segments
pub fn parse_timed_text(xml: &str) -> Vec<TranscriptSegment> {
    TEXT_REGEX
        .captures_iter(xml)
        .filter_map(|cap| {
            let start: f64 = cap.get(1)?.as_str().parse().ok()?;
            let duration: f64 = cap
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0.0);
            let text = clean_caption_text(cap.get(3)?.as_str());
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment {
                start,
                duration,
                text,
            })
        })
        .collect()
}

/// Decode entities (captions are often escaped twice) and drop inline markup
fn clean_caption_text(raw: &str) -> String {
    let decoded = decode_entities(&decode_entities(raw));
    let stripped = TAG_REGEX.replace_all(&decoded, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    ENTITY_REGEX
        .replace_all(s, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    let code = match entity.strip_prefix("#x") {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity[1..].parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
