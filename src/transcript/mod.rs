//! Transcript fetching, video id parsing and orchestration

pub mod fetcher;
pub mod models;
pub mod orchestrator;
pub mod video_id;

pub use fetcher::{FetcherConfig, TranscriptFetcher, YouTubeTranscriptFetcher};
pub use models::{truncate_chars, TranscriptResult, TranscriptType};
pub use orchestrator::{ProxyStrategy, TranscriptOrchestrator};
pub use video_id::extract_video_id;
