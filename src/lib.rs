//! Transcript Proxy - YouTube transcripts through rotating proxies
//!
//! Loads authenticated proxies from a flat file, fetches transcripts through
//! them with sequential failover, and stores the results in SQLite.

pub mod database;
pub mod error;
pub mod proxy;
pub mod transcript;

pub use error::{FetchError, ProxyError};
pub use proxy::{
    build_proxy_config, fetch_with_failover, setup_proxy_from_file, FailoverEvent, FailoverReport,
    ProxyAttempt, ProxyConfig, ProxyParser, ProxyRecord,
};
pub use transcript::{
    extract_video_id, FetcherConfig, ProxyStrategy, TranscriptFetcher, TranscriptOrchestrator,
    TranscriptResult, TranscriptType, YouTubeTranscriptFetcher,
};

use std::path::PathBuf;
use std::time::Duration;

/// Application result type
pub type Result<T> = anyhow::Result<T>;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database file path
    pub database_url: String,
    /// Proxy list, one `IP:PORT:USERNAME:PASSWORD` per line
    pub proxy_file: PathBuf,
    /// Preferred transcript languages, most wanted first
    pub languages: Vec<String>,
    /// Timeout for each HTTP request
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "transcripts.db".to_string(),
            proxy_file: PathBuf::from("proxies.txt"),
            languages: vec!["en".to_string()],
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Fetcher settings derived from this configuration
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig::new().with_timeout(self.timeout)
    }
}
