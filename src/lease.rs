//! RAII handle for an allocated proxy.

use crate::pool::ProxyPool;

use std::fmt;
use url::Url;

/// A proxy taken from a [`ProxyPool`] for one resource.
///
/// The proxy is marked free again when the lease is dropped, unless it was
/// detached with [`into_url`](Self::into_url). A lease only releases into the
/// list it was taken from: once the pool is reloaded, dropping it does
/// nothing, even when the new list contains the same proxy.
pub struct ProxyLease<'a> {
    pool: &'a ProxyPool,
    resource: String,
    url: Url,
    generation: u64,
    armed: bool,
}

impl<'a> ProxyLease<'a> {
    pub(crate) fn new(pool: &'a ProxyPool, resource: &str, url: Url, generation: u64) -> Self {
        Self {
            pool,
            resource: resource.to_owned(),
            url,
            generation,
            armed: true,
        }
    }

    /// The leased proxy.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The resource the proxy is busy for.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Keep the proxy busy and return its URL; releasing becomes the caller's job.
    pub fn into_url(mut self) -> Url {
        self.armed = false;
        self.url.clone()
    }
}

impl Drop for ProxyLease<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.pool.release(&self.resource, &self.url, self.generation);
        }
    }
}

impl fmt::Debug for ProxyLease<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyLease")
            .field("resource", &self.resource)
            .field("url", &self.url.as_str())
            .finish()
    }
}
