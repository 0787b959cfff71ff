//! Proxy data models

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single authenticated proxy as listed in the proxy file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRecord {
    pub ip: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl ProxyRecord {
    pub fn new(ip: String, port: u16, username: String, password: String) -> Self {
        Self {
            ip,
            port,
            username,
            password,
        }
    }

    /// Build the proxy URL for the given scheme
    pub fn url(&self, scheme: &str) -> String {
        format!(
            "{}://{}:{}@{}:{}",
            scheme, self.username, self.password, self.ip, self.port
        )
    }

    /// Get the proxy string in IP:PORT format
    pub fn to_simple_string(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    /// Get the proxy string in IP:PORT:USER:PASS format
    pub fn to_full_string(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.ip, self.port, self.username, self.password
        )
    }
}

impl fmt::Display for ProxyRecord {
    /// Credentials are never printed
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_simple_string())
    }
}

/// Proxy URLs handed to the HTTP client for one fetch attempt
///
/// Both URLs use the `http` scheme: https targets are tunnelled through the
/// proxy with `CONNECT`, never over TLS to the proxy itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub http_url: String,
    pub https_url: String,
}

impl ProxyConfig {
    pub fn from_record(record: &ProxyRecord) -> Self {
        Self {
            http_url: record.url("http"),
            https_url: record.url("http"),
        }
    }
}

impl From<&ProxyRecord> for ProxyConfig {
    fn from(record: &ProxyRecord) -> Self {
        Self::from_record(record)
    }
}
