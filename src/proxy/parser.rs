//! Proxy parser module for loading `IP:PORT:USER:PASS` proxy lists

use crate::error::ProxyError;
use crate::proxy::models::ProxyRecord;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Number of colon-separated fields on every proxy line
const FIELD_COUNT: usize = 4;

/// Proxy parser for parsing proxies from strings and files
pub struct ProxyParser;

impl ProxyParser {
    /// Parse a single proxy line
    ///
    /// Returns `Ok(None)` for blank lines and `#` comments.
    pub fn parse_line(line: &str, line_no: usize) -> Result<Option<ProxyRecord>, ProxyError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() != FIELD_COUNT {
            return Err(ProxyError::Parse {
                line: line_no,
                reason: format!(
                    "expected IP:PORT:USERNAME:PASSWORD, found {} field(s)",
                    parts.len()
                ),
            });
        }

        if parts[0].is_empty() {
            return Err(ProxyError::Parse {
                line: line_no,
                reason: "empty IP".to_string(),
            });
        }
        if parts[2].is_empty() {
            return Err(ProxyError::Parse {
                line: line_no,
                reason: "empty username".to_string(),
            });
        }

        let port: u16 = parts[1].parse().map_err(|_| ProxyError::Parse {
            line: line_no,
            reason: format!("invalid port '{}'", parts[1]),
        })?;

        Ok(Some(ProxyRecord::new(
            parts[0].to_string(),
            port,
            parts[2].to_string(),
            parts[3].to_string(),
        )))
    }

    /// Parse proxies from a string (multiple lines), keeping line order
    pub fn parse_string(content: &str) -> Result<Vec<ProxyRecord>, ProxyError> {
        let mut proxies = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if let Some(proxy) = Self::parse_line(line, idx + 1)? {
                proxies.push(proxy);
            }
        }
        Ok(proxies)
    }

    /// Load proxies from a file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<ProxyRecord>, ProxyError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ProxyError::FileNotFound(path.to_path_buf()),
            _ => ProxyError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let proxies = Self::parse_string(&content)?;
        tracing::debug!(count = proxies.len(), path = %path.display(), "loaded proxies");
        Ok(proxies)
    }
}
