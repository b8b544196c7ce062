//! Utility functions for the proxy pool.

use crate::error::{Error, Result};
use crate::proxy::Proxy;

use log::{info, warn};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Whether a configured source should be fetched over HTTP instead of read from disk.
pub(crate) fn is_url_source(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Fetch the raw proxy list behind a URL.
pub(crate) async fn fetch_url(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let client = Client::builder().timeout(timeout).build()?;
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Read one source, a file path or an http(s) URL.
pub(crate) async fn read_source(source: &str, timeout: Duration) -> Result<Vec<u8>> {
    if is_url_source(source) {
        fetch_url(source, timeout).await
    } else {
        Ok(tokio::fs::read(source).await?)
    }
}

/// Read every source and join them into a single newline separated list.
///
/// The first source that cannot be read aborts the whole read.
pub(crate) async fn read_sources(sources: &[String], timeout: Duration) -> Result<Vec<u8>> {
    if sources.is_empty() {
        return Err(Error::NoSources);
    }

    let mut content = Vec::new();
    for source in sources {
        let bytes = read_source(source, timeout).await.map_err(|e| {
            warn!("Failed to read proxies from {}: {}", source, e);
            e
        })?;
        info!("Read {} bytes of proxies from {}", bytes.len(), source);
        content.extend_from_slice(&bytes);
        content.push(b'\n');
    }
    Ok(content)
}

/// Parse newline separated proxy URLs.
///
/// Returns the accepted proxies and the rejected lines, both in input order.
/// A line is rejected when it is not an absolute URL or has no host.
/// Input is decoded as lossy UTF-8, so a rejected line with invalid bytes is
/// reported with U+FFFD in their place.
pub(crate) fn parse_proxy_list(content: &[u8]) -> (Vec<Proxy>, Vec<String>) {
    let mut good = Vec::new();
    let mut bad = Vec::new();

    for row in content.split(|b| *b == b'\n') {
        let row = String::from_utf8_lossy(row);
        let line = row.trim();
        if line.is_empty() {
            continue;
        }

        match Url::parse(line) {
            Ok(url) if url.host_str().is_some_and(|host| !host.is_empty()) => {
                good.push(Proxy::new(url));
            }
            _ => bad.push(line.to_string()),
        }
    }

    (good, bad)
}
