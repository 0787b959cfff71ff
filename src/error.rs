//! Error types for proxy loading and transcript fetching

use std::path::PathBuf;

/// Errors raised while loading proxies or selecting one
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("proxy file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read proxy file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("proxy index {index} out of range ({len} proxies loaded)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors raised by a single transcript fetch attempt
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("request blocked by YouTube: {0}")]
    RequestBlocked(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Short name of the failure, used in attempt summaries
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Http(e) if e.is_timeout() => "Timeout",
            FetchError::Http(e) if e.is_connect() => "ConnectError",
            FetchError::Http(_) => "HttpError",
            FetchError::Status(_) => "StatusError",
            FetchError::RequestBlocked(_) => "RequestBlocked",
            FetchError::InvalidResponse(_) => "InvalidResponse",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_error_messages() {
        let err = ProxyError::Parse {
            line: 3,
            reason: "expected 4 fields".to_string(),
        };
        assert_eq!(err.to_string(), "line 3: expected 4 fields");

        let err = ProxyError::IndexOutOfRange { index: 5, len: 2 };
        assert_eq!(err.to_string(), "proxy index 5 out of range (2 proxies loaded)");
    }

    #[test]
    fn test_fetch_error_kind() {
        assert_eq!(FetchError::Status(500).kind(), "StatusError");
        assert_eq!(
            FetchError::RequestBlocked("captcha".to_string()).kind(),
            "RequestBlocked"
        );
        assert_eq!(
            FetchError::InvalidResponse("bad json".to_string()).kind(),
            "InvalidResponse"
        );
    }
}
