//! Configuration for a proxy pool.

use std::time::Duration;

/// What a load does when the source contains no usable proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyLoadPolicy {
    /// Keep the current proxies and their busy state.
    #[default]
    Keep,
    /// Replace the current proxies with the empty list.
    Clear,
}

/// Configuration for a proxy pool.
#[derive(Debug, Clone)]
pub struct ProxyPoolConfig {
    /// Files or http(s) URLs to read the proxy list from on refresh.
    pub sources: Vec<String>,
    /// Behavior of a load that yields no good line.
    pub empty_load_policy: EmptyLoadPolicy,
    /// Timeout for fetching URL sources.
    pub fetch_timeout: Duration,
    /// Seed for proxy selection. `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl ProxyPoolConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProxyPoolConfigBuilder {
        ProxyPoolConfigBuilder::new()
    }
}

impl Default for ProxyPoolConfig {
    fn default() -> Self {
        ProxyPoolConfigBuilder::new().build()
    }
}

/// Builder for `ProxyPoolConfig`.
pub struct ProxyPoolConfigBuilder {
    sources: Vec<String>,
    empty_load_policy: Option<EmptyLoadPolicy>,
    fetch_timeout: Option<Duration>,
    seed: Option<u64>,
}

impl ProxyPoolConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            empty_load_policy: None,
            fetch_timeout: None,
            seed: None,
        }
    }

    /// Set the files or URLs the proxy list is read from.
    pub fn sources(mut self, sources: Vec<impl Into<String>>) -> Self {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Set what a load without any good line does.
    pub fn empty_load_policy(mut self, policy: EmptyLoadPolicy) -> Self {
        self.empty_load_policy = Some(policy);
        self
    }

    /// Set the timeout for fetching URL sources.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Seed proxy selection for reproducible allocation order.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ProxyPoolConfig {
        ProxyPoolConfig {
            sources: self.sources,
            empty_load_policy: self.empty_load_policy.unwrap_or_default(),
            fetch_timeout: self.fetch_timeout.unwrap_or(Duration::from_secs(10)),
            seed: self.seed,
        }
    }
}

impl Default for ProxyPoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
