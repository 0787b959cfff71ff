//! Proxy selection by index

use crate::error::ProxyError;
use crate::proxy::models::{ProxyConfig, ProxyRecord};
use crate::proxy::parser::ProxyParser;
use std::path::Path;

/// Build the proxy configuration for the record at `index`
///
/// Only `records[index]` is read. Nothing is cached between calls.
pub fn build_proxy_config(records: &[ProxyRecord], index: usize) -> Result<ProxyConfig, ProxyError> {
    records
        .get(index)
        .map(ProxyConfig::from_record)
        .ok_or(ProxyError::IndexOutOfRange {
            index,
            len: records.len(),
        })
}

/// Load a proxy file and build the configuration for one of its entries
pub fn setup_proxy_from_file<P: AsRef<Path>>(path: P, index: usize) -> Result<ProxyConfig, ProxyError> {
    let records = ProxyParser::load_file(path)?;
    build_proxy_config(&records, index)
}
