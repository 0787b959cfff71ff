//! Cache-first transcript retrieval backed by the database

use crate::database::TranscriptDatabase;
use crate::proxy::{fetch_with_failover, FailoverEvent, ProxyConfig, ProxyRecord};
use crate::transcript::{TranscriptFetcher, TranscriptResult};
use crate::Result;

/// How the orchestrator routes fetches
#[derive(Debug, Clone)]
pub enum ProxyStrategy {
    /// No proxy
    Direct,
    /// Always the same proxy
    Single(ProxyConfig),
    /// Every proxy in order until one returns a transcript
    Failover(Vec<ProxyRecord>),
}

/// Looks up stored transcripts and fetches missing ones
pub struct TranscriptOrchestrator<'a, F> {
    db: &'a TranscriptDatabase,
    fetcher: F,
    languages: Vec<String>,
    strategy: ProxyStrategy,
    refresh: bool,
}

impl<'a, F: TranscriptFetcher> TranscriptOrchestrator<'a, F> {
    pub fn new(db: &'a TranscriptDatabase, fetcher: F, strategy: ProxyStrategy) -> Self {
        Self {
            db,
            fetcher,
            languages: vec!["en".to_string()],
            strategy,
            refresh: false,
        }
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    /// Skip stored transcripts and always fetch
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Return the transcript for `video_id`, fetching and storing it if needed
    ///
    /// `Ok(None)` means no transcript could be obtained. In failover mode that
    /// includes every proxy failing.
    pub async fn get_transcript(&self, video_id: &str) -> Result<Option<TranscriptResult>> {
        if !self.refresh {
            for language in &self.languages {
                if let Some(record) = self.db.get_transcript(video_id, language).await? {
                    tracing::info!(video_id, language = %language, "using stored transcript");
                    return Ok(Some(record.transcript));
                }
            }
        }

        let fetched = match &self.strategy {
            ProxyStrategy::Direct => {
                self.fetcher
                    .fetch_transcript(video_id, &self.languages, None)
                    .await?
            }
            ProxyStrategy::Single(config) => {
                self.fetcher
                    .fetch_transcript(video_id, &self.languages, Some(config))
                    .await?
            }
            ProxyStrategy::Failover(proxies) => {
                fetch_with_failover(&self.fetcher, video_id, &self.languages, proxies, log_event)
                    .await
                    .into_transcript()
            }
        };

        match fetched {
            Some(transcript) => {
                self.db.save_transcript(&transcript).await?;
                Ok(Some(transcript))
            }
            None => Ok(None),
        }
    }
}

fn log_event(event: FailoverEvent<'_>) {
    if let FailoverEvent::Finished(attempt) = event {
        tracing::debug!(index = attempt.index, proxy = %attempt.proxy, status = ?attempt.status, "attempt finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::proxy::ProxyParser;
    use crate::transcript::TranscriptType;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Returns a transcript on call number `succeed_on` (zero-based), errors before
    struct CountingFetcher {
        calls: AtomicUsize,
        succeed_on: usize,
    }

    impl CountingFetcher {
        fn new(succeed_on: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                succeed_on,
            }
        }
    }

    #[async_trait]
    impl TranscriptFetcher for CountingFetcher {
        async fn fetch_transcript(
            &self,
            video_id: &str,
            languages: &[String],
            _proxy: Option<&ProxyConfig>,
        ) -> std::result::Result<Option<TranscriptResult>, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.succeed_on {
                return Err(FetchError::Status(403));
            }
            Ok(Some(TranscriptResult {
                video_id: video_id.to_string(),
                language: languages[0].clone(),
                transcript_type: TranscriptType::Manual,
                duration: 10.0,
                transcript: format!("call {}", call),
            }))
        }
    }

    async fn open_db() -> (TempDir, TranscriptDatabase) {
        let dir = tempfile::tempdir().unwrap();
        let db = TranscriptDatabase::new(dir.path().join("t.db")).await.unwrap();
        (dir, db)
    }

    fn proxies() -> Vec<ProxyRecord> {
        ProxyParser::parse_string("1.1.1.1:1:a:a\n2.2.2.2:2:b:b\n3.3.3.3:3:c:c").unwrap()
    }

    #[tokio::test]
    async fn test_fetches_and_stores() {
        let (_dir, db) = open_db().await;
        let orchestrator = TranscriptOrchestrator::new(&db, CountingFetcher::new(0), ProxyStrategy::Direct);

        let result = orchestrator.get_transcript("dQw4w9WgXcQ").await.unwrap().unwrap();
        assert_eq!(result.transcript, "call 0");

        let stored = db.get_transcript("dQw4w9WgXcQ", "en").await.unwrap().unwrap();
        assert_eq!(stored.transcript, result);
    }

    #[tokio::test]
    async fn test_uses_stored_transcript() {
        let (_dir, db) = open_db().await;
        let orchestrator = TranscriptOrchestrator::new(&db, CountingFetcher::new(0), ProxyStrategy::Direct);

        orchestrator.get_transcript("dQw4w9WgXcQ").await.unwrap();
        let second = orchestrator.get_transcript("dQw4w9WgXcQ").await.unwrap().unwrap();

        assert_eq!(second.transcript, "call 0");
        assert_eq!(orchestrator.fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_store() {
        let (_dir, db) = open_db().await;
        let orchestrator = TranscriptOrchestrator::new(&db, CountingFetcher::new(0), ProxyStrategy::Direct)
            .with_refresh(true);

        orchestrator.get_transcript("dQw4w9WgXcQ").await.unwrap();
        let second = orchestrator.get_transcript("dQw4w9WgXcQ").await.unwrap().unwrap();
        assert_eq!(second.transcript, "call 1");
    }

    #[tokio::test]
    async fn test_single_proxy_error_propagates() {
        let (_dir, db) = open_db().await;
        let config = ProxyConfig::from_record(&proxies()[0]);
        let orchestrator =
            TranscriptOrchestrator::new(&db, CountingFetcher::new(1), ProxyStrategy::Single(config));

        assert!(orchestrator.get_transcript("dQw4w9WgXcQ").await.is_err());
        assert!(db.list_transcripts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failover_strategy() {
        let (_dir, db) = open_db().await;
        let orchestrator =
            TranscriptOrchestrator::new(&db, CountingFetcher::new(2), ProxyStrategy::Failover(proxies()))
                .with_languages(vec!["de".to_string()]);

        let result = orchestrator.get_transcript("dQw4w9WgXcQ").await.unwrap().unwrap();
        assert_eq!(result.transcript, "call 2");
        assert_eq!(result.language, "de");
        assert!(db.get_transcript("dQw4w9WgXcQ", "de").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failover_exhausted_is_none() {
        let (_dir, db) = open_db().await;
        let orchestrator =
            TranscriptOrchestrator::new(&db, CountingFetcher::new(10), ProxyStrategy::Failover(proxies()));

        assert!(orchestrator.get_transcript("dQw4w9WgXcQ").await.unwrap().is_none());
        assert_eq!(orchestrator.fetcher.calls.load(Ordering::SeqCst), 3);
    }
}
