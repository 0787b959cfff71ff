//! Sequential proxy failover for transcript fetches

use crate::proxy::models::ProxyRecord;
use crate::proxy::selector::build_proxy_config;
use crate::transcript::{truncate_chars, TranscriptFetcher, TranscriptResult};
use serde::{Deserialize, Serialize};

/// Error messages longer than this are cut in attempt summaries
pub const ERROR_SUMMARY_CHARS: usize = 80;

/// Outcome of one proxy attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttemptStatus {
    Success,
    /// The request completed but returned no transcript
    NoTranscript,
    /// The fetch failed; holds the error kind and a truncated message
    Failed { kind: String, message: String },
}

/// Record of a single proxy attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyAttempt {
    /// Zero-based position of the proxy in the list
    pub index: usize,
    /// Proxy address in IP:PORT form
    pub proxy: String,
    pub status: AttemptStatus,
}

impl ProxyAttempt {
    pub fn success(index: usize, proxy: &ProxyRecord) -> Self {
        Self {
            index,
            proxy: proxy.to_simple_string(),
            status: AttemptStatus::Success,
        }
    }

    pub fn no_transcript(index: usize, proxy: &ProxyRecord) -> Self {
        Self {
            index,
            proxy: proxy.to_simple_string(),
            status: AttemptStatus::NoTranscript,
        }
    }

    pub fn failed(index: usize, proxy: &ProxyRecord, kind: &str, message: &str) -> Self {
        Self {
            index,
            proxy: proxy.to_simple_string(),
            status: AttemptStatus::Failed {
                kind: kind.to_string(),
                message: truncate_chars(message, ERROR_SUMMARY_CHARS).to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, AttemptStatus::Success)
    }
}

/// Progress notifications emitted while iterating proxies
#[derive(Debug)]
pub enum FailoverEvent<'a> {
    Started {
        index: usize,
        total: usize,
        proxy: &'a ProxyRecord,
    },
    Finished(&'a ProxyAttempt),
}

/// Result of a failover run
#[derive(Debug, Clone, Default)]
pub struct FailoverReport {
    /// Index of the proxy that worked and what it returned
    pub result: Option<(usize, TranscriptResult)>,
    /// Every attempt made, in order
    pub attempts: Vec<ProxyAttempt>,
}

impl FailoverReport {
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    pub fn into_transcript(self) -> Option<TranscriptResult> {
        self.result.map(|(_, transcript)| transcript)
    }
}

/// Try each proxy in order until one returns a transcript
///
/// Fetch errors and empty results are recorded and skipped. Running out of
/// proxies yields a report without a result, never an error.
pub async fn fetch_with_failover<F, E>(
    fetcher: &F,
    video_id: &str,
    languages: &[String],
    proxies: &[ProxyRecord],
    mut on_event: E,
) -> FailoverReport
where
    F: TranscriptFetcher + ?Sized,
    E: FnMut(FailoverEvent<'_>),
{
    let mut report = FailoverReport::default();
    let total = proxies.len();

    for (index, proxy) in proxies.iter().enumerate() {
        on_event(FailoverEvent::Started {
            index,
            total,
            proxy,
        });
        tracing::info!(index, total, proxy = %proxy, video_id, "trying proxy");

        let attempt = match build_proxy_config(proxies, index) {
            Err(e) => ProxyAttempt::failed(index, proxy, "ProxyError", &e.to_string()),
            Ok(config) => match fetcher
                .fetch_transcript(video_id, languages, Some(&config))
                .await
            {
                Ok(Some(transcript)) => {
                    let attempt = ProxyAttempt::success(index, proxy);
                    on_event(FailoverEvent::Finished(&attempt));
                    report.attempts.push(attempt);
                    report.result = Some((index, transcript));
                    tracing::info!(index, proxy = %proxy, "proxy returned a transcript");
                    return report;
                }
                Ok(None) => {
                    tracing::warn!(index, proxy = %proxy, "no transcript returned");
                    ProxyAttempt::no_transcript(index, proxy)
                }
                Err(e) => {
                    tracing::warn!(index, proxy = %proxy, kind = e.kind(), error = %e, "proxy attempt failed");
                    ProxyAttempt::failed(index, proxy, e.kind(), &e.to_string())
                }
            },
        };

        on_event(FailoverEvent::Finished(&attempt));
        report.attempts.push(attempt);
    }

    tracing::warn!(attempts = report.attempts.len(), video_id, "all proxies exhausted");
    report
}
