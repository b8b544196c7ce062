//! Proxy lists split by address family.

use crate::config::ProxyPoolConfig;
use crate::error::{Error, Result};
use crate::lease::ProxyLease;
use crate::pool::ProxyPool;

use futures::future;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tokio::io::AsyncRead;
use url::Url;

const BANNER: &str = "-----------------";

/// Address family of a proxy list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    /// Both families, IPv4 first.
    pub const ALL: [Family; 2] = [Family::V4, Family::V6];

    /// Label used when rendering the list.
    pub fn label(self) -> &'static str {
        match self {
            Family::V4 => "IP4",
            Family::V6 => "IP6",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Numeric tags: `0` is IPv4, `1` is IPv6.
impl TryFrom<u8> for Family {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Family::V4),
            1 => Ok(Family::V6),
            _ => Err(Error::UnknownFamily(tag.to_string())),
        }
    }
}

impl FromStr for Family {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ip4" | "ipv4" | "v4" => Ok(Family::V4),
            "ip6" | "ipv6" | "v6" => Ok(Family::V6),
            _ => Err(Error::UnknownFamily(s.to_string())),
        }
    }
}

impl TryFrom<&str> for Family {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

/// Two independent proxy pools, one per address family.
///
/// Every operation names the family it applies to, either as a [`Family`] or
/// as a raw tag (`u8` or `&str`). Queries and allocation with an unknown tag
/// quietly find nothing; loads with an unknown tag fail with
/// [`Error::UnknownFamily`]. No operation ever locks both pools.
#[derive(Default)]
pub struct ProxyList {
    ip4: ProxyPool,
    ip6: ProxyPool,
}

impl ProxyList {
    /// Create a list with two empty pools and the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list with one configuration per family.
    pub fn with_config(ip4: ProxyPoolConfig, ip6: ProxyPoolConfig) -> Self {
        Self {
            ip4: ProxyPool::with_config(ip4),
            ip6: ProxyPool::with_config(ip6),
        }
    }

    /// The pool holding `family` proxies.
    pub fn pool(&self, family: Family) -> &ProxyPool {
        match family {
            Family::V4 => &self.ip4,
            Family::V6 => &self.ip6,
        }
    }

    fn select<F: TryInto<Family>>(&self, family: F) -> Option<&ProxyPool> {
        family.try_into().ok().map(|family| self.pool(family))
    }

    fn require<F>(&self, family: F) -> Result<&ProxyPool>
    where
        F: TryInto<Family>,
        Error: From<F::Error>,
    {
        Ok(self.pool(family.try_into()?))
    }

    /// Replace the proxies of one family. Returns the rejected lines.
    pub fn load<F>(&self, content: &[u8], family: F) -> Result<Vec<String>>
    where
        F: TryInto<Family>,
        Error: From<F::Error>,
    {
        Ok(self.require(family)?.load(content))
    }

    /// Replace the proxies of one family with the contents of a file.
    pub fn load_file<F>(&self, path: impl AsRef<Path>, family: F) -> Result<Vec<String>>
    where
        F: TryInto<Family>,
        Error: From<F::Error>,
    {
        self.require(family)?.load_file(path)
    }

    /// Replace the proxies of one family with everything `reader` yields.
    pub fn load_reader<F>(&self, reader: impl Read, family: F) -> Result<Vec<String>>
    where
        F: TryInto<Family>,
        Error: From<F::Error>,
    {
        self.require(family)?.load_reader(reader)
    }

    /// Replace the proxies of one family with everything an async `reader` yields.
    pub async fn load_async_reader<R, F>(&self, reader: R, family: F) -> Result<Vec<String>>
    where
        R: AsyncRead + Unpin,
        F: TryInto<Family>,
        Error: From<F::Error>,
    {
        self.require(family)?.load_async_reader(reader).await
    }

    /// Replace the proxies of one family with the list behind an http(s) URL.
    pub async fn load_url<F>(&self, url: &str, family: F) -> Result<Vec<String>>
    where
        F: TryInto<Family>,
        Error: From<F::Error>,
    {
        self.require(family)?.load_url(url).await
    }

    /// Reload both families from their configured sources concurrently.
    ///
    /// A family without sources is left as is and reports no bad line. Both
    /// loads always run to completion, so a failing family never stops the
    /// other one from being replaced. Returns the outcome as `(ip4, ip6)`,
    /// each holding the rejected lines or that family's error.
    ///
    /// Fails with [`Error::NoSources`] only when neither family has a source.
    pub async fn refresh(&self) -> Result<(Result<Vec<String>>, Result<Vec<String>>)> {
        if self.ip4.config.sources.is_empty() && self.ip6.config.sources.is_empty() {
            return Err(Error::NoSources);
        }
        Ok(future::join(refresh_configured(&self.ip4), refresh_configured(&self.ip6)).await)
    }

    /// Pick a random proxy of `family` that is free for `resource` and mark it busy.
    pub fn get_free<F: TryInto<Family>>(&self, resource: &str, family: F) -> Option<Url> {
        self.select(family)?.get_free(resource)
    }

    /// Like [`get_free`](Self::get_free), but the proxy is released when the lease is dropped.
    pub fn lease<F: TryInto<Family>>(&self, resource: &str, family: F) -> Option<ProxyLease<'_>> {
        self.select(family)?.lease(resource)
    }

    /// Clear the busy mark of `url` for `resource` in `family`.
    pub fn set_free<F: TryInto<Family>>(&self, resource: &str, url: &Url, family: F) {
        if let Some(pool) = self.select(family) {
            pool.set_free(resource, url);
        }
    }

    /// Mark `url` as busy for `resource` in `family`.
    pub fn set_busy<F: TryInto<Family>>(&self, resource: &str, url: &Url, family: F) {
        if let Some(pool) = self.select(family) {
            pool.set_busy(resource, url);
        }
    }

    /// Whether `url` is busy for `resource` in `family`.
    pub fn is_busy<F: TryInto<Family>>(&self, resource: &str, url: &Url, family: F) -> bool {
        self.select(family).is_some_and(|pool| pool.is_busy(resource, url))
    }

    /// Position of the first `family` proxy matching `url`.
    pub fn index<F: TryInto<Family>>(&self, url: &Url, family: F) -> Option<usize> {
        self.select(family)?.index(url)
    }

    /// Number of `family` proxies.
    pub fn len<F: TryInto<Family>>(&self, family: F) -> usize {
        self.select(family).map_or(0, ProxyPool::len)
    }

    /// Number of `family` proxies busy for `resource`.
    pub fn num_busy<F: TryInto<Family>>(&self, resource: &str, family: F) -> usize {
        self.select(family).map_or(0, |pool| pool.num_busy(resource))
    }

    /// Number of `family` proxies free for `resource`.
    pub fn num_free<F: TryInto<Family>>(&self, resource: &str, family: F) -> usize {
        self.select(family).map_or(0, |pool| pool.num_free(resource))
    }

    /// Render one family as a bannered block.
    pub fn render_family(&self, family: Family) -> String {
        let mut text = format!("{BANNER}\n{} PROXY\n{BANNER}\n", family.label());
        let lines = self.pool(family).to_text();
        if lines.is_empty() {
            text.push_str("empty list\n");
        } else {
            text.push_str(&lines);
        }
        text
    }
}

async fn refresh_configured(pool: &ProxyPool) -> Result<Vec<String>> {
    if pool.config.sources.is_empty() {
        return Ok(Vec::new());
    }
    pool.refresh().await
}

impl fmt::Display for ProxyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}",
            self.render_family(Family::V4),
            self.render_family(Family::V6)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &[u8] =
        b"\nhttp://proxy1\nhttp://proxy2\nhttp://proxy3\nhttp://proxy4\nbad-proxy.com\n";

    #[test]
    fn family_tags() {
        assert_eq!(Family::try_from(0u8).unwrap(), Family::V4);
        assert_eq!(Family::try_from(1u8).unwrap(), Family::V6);
        assert!(matches!(Family::try_from(2u8), Err(Error::UnknownFamily(tag)) if tag == "2"));
        assert_eq!("IPv6".parse::<Family>().unwrap(), Family::V6);
        assert_eq!(Family::try_from("v4").unwrap(), Family::V4);
        assert!("ip5".parse::<Family>().is_err());
    }

    #[test]
    fn families_are_independent() {
        let list = ProxyList::new();
        assert_eq!(list.load(LIST, Family::V4).unwrap(), vec!["bad-proxy.com"]);
        assert_eq!(list.load(LIST, Family::V6).unwrap().len(), 1);

        list.get_free("site", Family::V4).unwrap();
        assert_eq!(list.num_busy("site", Family::V4), 1);
        assert_eq!(list.num_free("site", Family::V4), 3);
        assert_eq!(list.num_busy("site", Family::V6), 0);
        assert_eq!(list.num_free("site", Family::V6), 4);
    }

    #[test]
    fn raw_tags_dispatch() {
        let list = ProxyList::new();
        list.load(LIST, 0u8).unwrap();
        list.load(b"http://[::1]:8080\n", "ip6").unwrap();

        assert_eq!(list.len(0u8), 4);
        assert_eq!(list.len("ip6"), 1);
        let url = list.get_free("site", 1u8).unwrap();
        assert_eq!(url.as_str(), "http://[::1]:8080/");
        assert_eq!(list.index(&url, Family::V6), Some(0));
        assert_eq!(list.index(&url, Family::V4), None);
    }

    #[test]
    fn unknown_tag_degrades_silently() {
        let list = ProxyList::new();
        list.load(LIST, Family::V4).unwrap();
        let url = Url::parse("http://proxy1").unwrap();

        assert_eq!(list.get_free("site", 9u8), None);
        assert!(list.lease("site", "ip5").is_none());
        assert_eq!(list.len(9u8), 0);
        assert_eq!(list.num_busy("site", 9u8), 0);
        assert_eq!(list.num_free("site", 9u8), 0);
        assert_eq!(list.index(&url, 9u8), None);
        list.set_busy("site", &url, 9u8);
        list.set_free("site", &url, 9u8);
        assert!(!list.is_busy("site", &url, 9u8));
        assert_eq!(list.num_busy("site", Family::V4), 0);
    }

    #[test]
    fn unknown_tag_fails_loads() {
        let list = ProxyList::new();
        assert!(matches!(list.load(LIST, 7u8), Err(Error::UnknownFamily(_))));
        assert!(matches!(list.load_reader(LIST, "ipx"), Err(Error::UnknownFamily(_))));
        assert_eq!(list.len(Family::V4), 0);
    }

    #[test]
    fn render_blocks() {
        let list = ProxyList::new();
        list.load(b"http://proxy1\n", Family::V4).unwrap();
        assert_eq!(
            list.to_string(),
            "-----------------\nIP4 PROXY\n-----------------\nhttp://proxy1\n\
             \n\
             -----------------\nIP6 PROXY\n-----------------\nempty list\n"
        );
    }
}
