//! Proxy pool without resource keys.

use crate::config::ProxyPoolConfig;
use crate::error::Result;
use crate::lease::ProxyLease;
use crate::pool::ProxyPool;

use std::fmt;
use std::io::Read;
use std::path::Path;
use tokio::io::AsyncRead;
use url::Url;

/// Resource key used for every operation of a [`SimpleProxyPool`].
pub const DEFAULT_RESOURCE: &str = "";

/// A proxy pool with a single global busy flag per proxy.
///
/// This is a [`ProxyPool`] where every call uses [`DEFAULT_RESOURCE`].
/// Its `Display` output tags each proxy with `+` (busy) or `-` (free).
#[derive(Default)]
pub struct SimpleProxyPool {
    inner: ProxyPool,
}

impl SimpleProxyPool {
    /// Create an empty pool with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty pool with the given configuration.
    pub fn with_config(config: ProxyPoolConfig) -> Self {
        Self {
            inner: ProxyPool::with_config(config),
        }
    }

    /// The underlying keyed pool.
    pub fn pool(&self) -> &ProxyPool {
        &self.inner
    }

    /// Replace the pool contents with the proxies parsed from `content`.
    pub fn load(&self, content: &[u8]) -> Vec<String> {
        self.inner.load(content)
    }

    /// Load the proxy list from a file.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        self.inner.load_file(path)
    }

    /// Load the proxy list from a reader, consuming it to the end.
    pub fn load_reader(&self, reader: impl Read) -> Result<Vec<String>> {
        self.inner.load_reader(reader)
    }

    /// Load the proxy list from an async reader, consuming it to the end.
    pub async fn load_async_reader<R>(&self, reader: R) -> Result<Vec<String>>
    where
        R: AsyncRead + Unpin,
    {
        self.inner.load_async_reader(reader).await
    }

    /// Fetch the proxy list from an http(s) URL.
    pub async fn load_url(&self, url: &str) -> Result<Vec<String>> {
        self.inner.load_url(url).await
    }

    /// Reload the pool from every configured source.
    pub async fn refresh(&self) -> Result<Vec<String>> {
        self.inner.refresh().await
    }

    /// Pick a random free proxy and mark it busy.
    pub fn get_free(&self) -> Option<Url> {
        self.inner.get_free(DEFAULT_RESOURCE)
    }

    /// Like [`get_free`](Self::get_free), but the proxy is released when the lease is dropped.
    pub fn lease(&self) -> Option<ProxyLease<'_>> {
        self.inner.lease(DEFAULT_RESOURCE)
    }

    /// Mark `url` free again. Unknown proxies are ignored.
    pub fn set_free(&self, url: &Url) {
        self.inner.set_free(DEFAULT_RESOURCE, url)
    }

    /// Mark `url` as busy. Unknown proxies are ignored.
    pub fn set_busy(&self, url: &Url) {
        self.inner.set_busy(DEFAULT_RESOURCE, url)
    }

    /// Whether `url` is busy. Always false for unknown proxies.
    pub fn is_busy(&self, url: &Url) -> bool {
        self.inner.is_busy(DEFAULT_RESOURCE, url)
    }

    /// Position of the first proxy matching `url`.
    pub fn index(&self, url: &Url) -> Option<usize> {
        self.inner.index(url)
    }

    /// Total number of proxies.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the pool holds no proxy.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of busy proxies.
    pub fn num_busy(&self) -> usize {
        self.inner.num_busy(DEFAULT_RESOURCE)
    }

    /// Number of free proxies.
    pub fn num_free(&self) -> usize {
        self.inner.num_free(DEFAULT_RESOURCE)
    }
}

impl fmt::Display for SimpleProxyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.inner.render_with(|proxy| {
            let tag = if proxy.is_busy(DEFAULT_RESOURCE) { "+" } else { "-" };
            format!("{} {}\n", proxy, tag)
        });
        f.write_str(&text)
    }
}
