//! Proxy module for loading proxies and failing over between them
//!
//! This module provides functionality for:
//! - Parsing `IP:PORT:USER:PASS` proxy lists
//! - Building per-attempt proxy configurations
//! - Trying proxies one by one until a transcript comes back

pub mod failover;
pub mod models;
pub mod parser;
pub mod selector;

pub use failover::{fetch_with_failover, AttemptStatus, FailoverEvent, FailoverReport, ProxyAttempt};
pub use models::{ProxyConfig, ProxyRecord};
pub use parser::ProxyParser;
pub use selector::{build_proxy_config, setup_proxy_from_file};
