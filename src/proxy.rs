//! Proxy representation and busy state.

use std::collections::HashMap;
use std::fmt;
use url::{Position, Url};

/// The canonical address string of `url`, used as proxy identity.
///
/// This is the serialized URL without the lone `/` path the parser adds to
/// `http`-like schemes, so `http://p1` and `http://p1/` both read `http://p1`.
pub fn canonical(url: &Url) -> String {
    if url.has_host() && url.path() == "/" {
        format!("{}{}", &url[..Position::BeforePath], &url[Position::AfterPath..])
    } else {
        url.as_str().to_owned()
    }
}

/// A single proxy endpoint tracked by a pool.
///
/// The URL is the identity of the proxy and never changes after construction.
/// Busy state is kept per resource key; a key that was never marked is free.
#[derive(Debug, Clone)]
pub struct Proxy {
    /// The URL of the proxy (e.g. "socks5://127.0.0.1:1080").
    url: Url,
    /// Canonical form of `url`.
    address: String,
    /// Busy flag per resource key.
    busy: HashMap<String, bool>,
}

impl Proxy {
    /// Create a new proxy with no busy marks.
    pub fn new(url: Url) -> Self {
        Self {
            address: canonical(&url),
            url,
            busy: HashMap::new(),
        }
    }

    /// The parsed URL of the proxy.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The canonical address string, used as the proxy identity.
    pub fn as_str(&self) -> &str {
        &self.address
    }

    /// Whether `url` refers to this proxy.
    pub fn matches(&self, url: &Url) -> bool {
        self.address == canonical(url)
    }

    /// Mark the proxy as in use for `resource`.
    pub fn set_busy(&mut self, resource: &str) {
        self.busy.insert(resource.to_owned(), true);
    }

    /// Clear the busy mark for `resource`.
    pub fn set_free(&mut self, resource: &str) {
        if let Some(flag) = self.busy.get_mut(resource) {
            *flag = false;
        }
    }

    /// Whether the proxy is in use for `resource`.
    pub fn is_busy(&self, resource: &str) -> bool {
        self.busy.get(resource).copied().unwrap_or(false)
    }

    /// Whether the proxy is available for `resource`.
    pub fn is_free(&self, resource: &str) -> bool {
        !self.is_busy(resource)
    }
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Proxy {}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
