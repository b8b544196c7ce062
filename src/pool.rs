//! Core proxy pool implementation.

use crate::config::{EmptyLoadPolicy, ProxyPoolConfig};
use crate::error::Result;
use crate::lease::ProxyLease;
use crate::proxy::{self, Proxy};
use crate::utils;

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;

/// A pool of proxies handed out under a busy/free discipline.
///
/// Busy state is tracked per resource key, so the same proxy can be in use
/// for one target site while still free for another. All operations are
/// synchronous and safe to call from many threads; reads share the lock,
/// writes hold it exclusively for their full duration.
pub struct ProxyPool {
    /// All proxies in the pool, in load order.
    proxies: RwLock<Vec<Proxy>>,
    /// Configuration for the pool.
    pub config: ProxyPoolConfig,
    /// Used for random proxy selection. Only locked while `proxies` is write-locked.
    rng: Mutex<StdRng>,
    /// Bumped on every replacement of `proxies`. Only written while `proxies` is write-locked.
    generation: AtomicU64,
}

impl ProxyPool {
    /// Create an empty pool with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ProxyPoolConfig::default())
    }

    /// Create an empty pool with the given configuration.
    pub fn with_config(config: ProxyPoolConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            proxies: RwLock::new(Vec::new()),
            config,
            rng: Mutex::new(rng),
            generation: AtomicU64::new(0),
        }
    }

    /// Parse a proxy list without touching the pool.
    ///
    /// Returns the accepted proxies and the rejected lines.
    pub fn parse(content: &[u8]) -> (Vec<Proxy>, Vec<String>) {
        utils::parse_proxy_list(content)
    }

    /// Replace the pool contents with the proxies parsed from `content`.
    ///
    /// All busy state is discarded. When no line is usable the configured
    /// [`EmptyLoadPolicy`] decides whether the current proxies survive.
    /// Returns the rejected lines.
    pub fn load(&self, content: &[u8]) -> Vec<String> {
        let (good, bad) = Self::parse(content);
        for line in &bad {
            warn!("Skipping bad proxy line: {}", line);
        }

        if good.is_empty() {
            match self.config.empty_load_policy {
                EmptyLoadPolicy::Keep => {
                    warn!("No usable proxy in list, keeping {} current proxies", self.len());
                    return bad;
                }
                EmptyLoadPolicy::Clear => {
                    warn!("No usable proxy in list, clearing pool");
                }
            }
        }

        let total = good.len();
        {
            let mut proxies = self.proxies.write();
            *proxies = good;
            self.generation.fetch_add(1, Ordering::Relaxed);
        }
        info!("Loaded {} proxies, {} bad lines", total, bad.len());
        bad
    }

    /// Load the proxy list from a file.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let content = std::fs::read(path)?;
        Ok(self.load(&content))
    }

    /// Load the proxy list from a reader, consuming it to the end.
    pub fn load_reader(&self, mut reader: impl Read) -> Result<Vec<String>> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        Ok(self.load(&content))
    }

    /// Load the proxy list from an async reader, consuming it to the end.
    pub async fn load_async_reader<R>(&self, mut reader: R) -> Result<Vec<String>>
    where
        R: AsyncRead + Unpin,
    {
        let mut content = Vec::new();
        reader.read_to_end(&mut content).await?;
        Ok(self.load(&content))
    }

    /// Fetch the proxy list from an http(s) URL.
    pub async fn load_url(&self, url: &str) -> Result<Vec<String>> {
        let content = utils::fetch_url(url, self.config.fetch_timeout).await?;
        Ok(self.load(&content))
    }

    /// Reload the pool from every configured source.
    ///
    /// Sources are joined into one list and loaded at once. If any source
    /// cannot be read the pool is left untouched.
    pub async fn refresh(&self) -> Result<Vec<String>> {
        info!("Refreshing proxy pool from {} sources", self.config.sources.len());
        let content = utils::read_sources(&self.config.sources, self.config.fetch_timeout).await?;
        Ok(self.load(&content))
    }

    /// Pick a random proxy that is free for `resource` and mark it busy.
    ///
    /// Returns `None` when every proxy is busy for `resource` or the pool is empty.
    pub fn get_free(&self, resource: &str) -> Option<Url> {
        self.claim(resource).map(|(url, _)| url)
    }

    /// Like [`get_free`](Self::get_free), but the proxy is released when the lease is dropped.
    pub fn lease(&self, resource: &str) -> Option<ProxyLease<'_>> {
        self.claim(resource)
            .map(|(url, generation)| ProxyLease::new(self, resource, url, generation))
    }

    /// Claim a free proxy, returning it with the generation of the list it came from.
    fn claim(&self, resource: &str) -> Option<(Url, u64)> {
        let mut proxies = self.proxies.write();
        let generation = self.generation.load(Ordering::Relaxed);

        let mut order: Vec<usize> = (0..proxies.len()).collect();
        order.shuffle(&mut *self.rng.lock());

        match order.into_iter().find(|&i| proxies[i].is_free(resource)) {
            Some(index) => {
                let proxy = &mut proxies[index];
                proxy.set_busy(resource);
                debug!("Proxy {} taken for {:?}", proxy, resource);
                Some((proxy.url().clone(), generation))
            }
            None => {
                debug!("No free proxy for {:?} among {}", resource, proxies.len());
                None
            }
        }
    }

    /// Clear the busy mark of `url` for `resource`, unless the list was
    /// replaced since `generation`.
    pub(crate) fn release(&self, resource: &str, url: &Url, generation: u64) {
        let mut proxies = self.proxies.write();
        if self.generation.load(Ordering::Relaxed) != generation {
            debug!("Proxy {} belongs to a replaced list, not releasing", url);
            return;
        }
        if let Some(index) = position(&proxies, url) {
            proxies[index].set_free(resource);
            debug!("Proxy {} released for {:?}", url, resource);
        }
    }

    /// Clear the busy mark of `url` for `resource`. Unknown proxies are ignored.
    pub fn set_free(&self, resource: &str, url: &Url) {
        let mut proxies = self.proxies.write();
        if let Some(index) = position(&proxies, url) {
            proxies[index].set_free(resource);
            debug!("Proxy {} released for {:?}", url, resource);
        }
    }

    /// Mark `url` as busy for `resource`. Unknown proxies are ignored.
    pub fn set_busy(&self, resource: &str, url: &Url) {
        let mut proxies = self.proxies.write();
        if let Some(index) = position(&proxies, url) {
            proxies[index].set_busy(resource);
        }
    }

    /// Whether `url` is busy for `resource`. Always false for unknown proxies.
    pub fn is_busy(&self, resource: &str, url: &Url) -> bool {
        let proxies = self.proxies.read();
        position(&proxies, url).is_some_and(|index| proxies[index].is_busy(resource))
    }

    /// Position of the first proxy matching `url`.
    pub fn index(&self, url: &Url) -> Option<usize> {
        position(&self.proxies.read(), url)
    }

    /// Total number of proxies.
    pub fn len(&self) -> usize {
        self.proxies.read().len()
    }

    /// Whether the pool holds no proxy.
    pub fn is_empty(&self) -> bool {
        self.proxies.read().is_empty()
    }

    /// Number of proxies busy for `resource`.
    pub fn num_busy(&self, resource: &str) -> usize {
        count_busy(&self.proxies.read(), resource)
    }

    /// Number of proxies free for `resource`.
    pub fn num_free(&self, resource: &str) -> usize {
        let proxies = self.proxies.read();
        proxies.len() - count_busy(&proxies, resource)
    }

    /// Snapshot of the proxy URLs in pool order.
    pub fn urls(&self) -> Vec<Url> {
        self.proxies.read().iter().map(|p| p.url().clone()).collect()
    }

    /// One canonical proxy URL per line, in pool order.
    pub fn to_text(&self) -> String {
        self.render_with(|proxy| format!("{}\n", proxy))
    }

    /// Render every proxy with `line` under a single read lock.
    pub(crate) fn render_with<F>(&self, line: F) -> String
    where
        F: Fn(&Proxy) -> String,
    {
        self.proxies.read().iter().map(line).collect()
    }
}

impl Default for ProxyPool {
    fn default() -> Self {
        Self::new()
    }
}

fn position(proxies: &[Proxy], url: &Url) -> Option<usize> {
    let address = proxy::canonical(url);
    proxies.iter().position(|p| p.as_str() == address)
}

fn count_busy(proxies: &[Proxy], resource: &str) -> usize {
    proxies.iter().filter(|p| p.is_busy(resource)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const LIST: &[u8] = b"http://p1\nhttp://p2\nbad host\n";

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn load_reports_bad_lines() {
        let pool = ProxyPool::new();
        let bad = pool.load(LIST);
        assert_eq!(bad, vec!["bad host"]);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.to_text(), "http://p1\nhttp://p2\n");
    }

    #[test]
    fn get_free_until_exhausted() {
        let pool = ProxyPool::new();
        pool.load(LIST);

        let first = pool.get_free("").unwrap();
        let second = pool.get_free("").unwrap();
        assert_ne!(first, second);

        let got: HashSet<String> = [proxy::canonical(&first), proxy::canonical(&second)].into();
        let want: HashSet<String> = ["http://p1".to_string(), "http://p2".to_string()].into();
        assert_eq!(got, want);

        assert_eq!(pool.get_free(""), None);
        assert_eq!(pool.num_busy(""), 2);
        assert_eq!(pool.num_free(""), 0);
    }

    #[test]
    fn get_free_on_empty_pool() {
        let pool = ProxyPool::new();
        assert!(pool.is_empty());
        assert_eq!(pool.get_free("site"), None);
    }

    #[test]
    fn release_makes_one_more_allocation_possible() {
        let pool = ProxyPool::new();
        pool.load(b"http://p1\nhttp://p2\nhttp://p3\n");
        let taken: Vec<Url> = (0..3).map(|_| pool.get_free("site").unwrap()).collect();
        assert_eq!(pool.get_free("site"), None);

        pool.set_free("site", &taken[1]);
        assert_eq!(pool.get_free("site"), Some(taken[1].clone()));
        assert_eq!(pool.get_free("site"), None);
    }

    #[test]
    fn set_free_is_idempotent() {
        let pool = ProxyPool::new();
        pool.load(LIST);
        let taken = pool.get_free("site").unwrap();

        pool.set_free("site", &taken);
        let once = (pool.num_busy("site"), pool.is_busy("site", &taken));
        pool.set_free("site", &taken);
        let twice = (pool.num_busy("site"), pool.is_busy("site", &taken));
        assert_eq!(once, (0, false));
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_proxy_is_ignored() {
        let pool = ProxyPool::new();
        pool.load(LIST);
        let unknown = url("http://127.0.0.0/");

        pool.set_busy("site", &unknown);
        pool.set_free("site", &unknown);
        assert!(!pool.is_busy("site", &unknown));
        assert_eq!(pool.index(&unknown), None);
        assert_eq!(pool.num_busy("site"), 0);
    }

    #[test]
    fn resources_are_isolated() {
        let pool = ProxyPool::new();
        pool.load(LIST);
        let p1 = url("http://p1");

        pool.set_busy("a", &p1);
        assert!(pool.is_busy("a", &p1));
        assert!(!pool.is_busy("b", &p1));
        assert_eq!(pool.num_free("b"), 2);
        assert_eq!(pool.num_free("a"), 1);
    }

    #[test]
    fn index_finds_first_match() {
        let pool = ProxyPool::new();
        pool.load(b"http://p1\nhttp://p2\nhttp://p2\n");
        assert_eq!(pool.index(&url("http://p1")), Some(0));
        assert_eq!(pool.index(&url("http://p2")), Some(1));
        assert_eq!(pool.index(&url("http://p2/")), Some(1));
    }

    #[test]
    fn get_free_reaches_every_proxy() {
        let pool = ProxyPool::new();
        pool.load(b"http://p1\nhttp://p2\nhttp://p3\nhttp://p4\nhttp://p5\n");

        let mut seen = HashSet::new();
        for _ in 0..500 {
            let url = pool.get_free("site").unwrap();
            pool.set_free("site", &url);
            seen.insert(proxy::canonical(&url));
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(pool.num_busy("site"), 0);
    }

    #[test]
    fn empty_load_keeps_pool_by_default() {
        let pool = ProxyPool::new();
        pool.load(LIST);
        let taken = pool.get_free("site").unwrap();

        let bad = pool.load(b"garbage\n\n");
        assert_eq!(bad, vec!["garbage"]);
        assert_eq!(pool.len(), 2);
        assert!(pool.is_busy("site", &taken));
    }

    #[test]
    fn empty_load_clears_pool_when_configured() {
        let config = ProxyPoolConfig::builder()
            .empty_load_policy(EmptyLoadPolicy::Clear)
            .build();
        let pool = ProxyPool::with_config(config);
        pool.load(LIST);

        let bad = pool.load(b"");
        assert!(bad.is_empty());
        assert!(pool.is_empty());
        assert_eq!(pool.get_free("site"), None);
    }

    #[test]
    fn load_replaces_entries_and_busy_state() {
        let pool = ProxyPool::new();
        pool.load(b"http://old1\nhttp://old2\n");
        pool.get_free("site").unwrap();

        pool.load(b"http://old1\nhttp://new\n");
        assert_eq!(pool.index(&url("http://old2")), None);
        assert_eq!(pool.index(&url("http://new")), Some(1));
        assert_eq!(pool.num_busy("site"), 0);
    }

    #[test]
    fn seeded_pools_allocate_in_the_same_order() {
        let list = b"http://p1\nhttp://p2\nhttp://p3\nhttp://p4\nhttp://p5\n";
        let a = ProxyPool::with_config(ProxyPoolConfig::builder().seed(42).build());
        let b = ProxyPool::with_config(ProxyPoolConfig::builder().seed(42).build());
        a.load(list);
        b.load(list);

        let from_a: Vec<_> = std::iter::from_fn(|| a.get_free("")).collect();
        let from_b: Vec<_> = std::iter::from_fn(|| b.get_free("")).collect();
        assert_eq!(from_a.len(), 5);
        assert_eq!(from_a, from_b);
    }

    #[test]
    fn load_reader_and_file() {
        let pool = ProxyPool::new();
        let bad = pool.load_reader(&b"socks5://1.2.3.4:1080\nnope\n"[..]).unwrap();
        assert_eq!(bad, vec!["nope"]);
        assert_eq!(pool.len(), 1);

        let err = pool.load_file("/definitely/not/here/proxies.txt").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
        assert_eq!(pool.len(), 1);
    }
}
