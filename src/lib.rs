//! # proxy-busy-pool
//!
//! Busy/free bookkeeping for proxy lists.
//!
//! This library keeps an in-memory list of proxy URLs, loaded from a file, a
//! reader or an HTTP source, and hands them out to concurrent callers. A proxy
//! taken with `get_free` stays busy until it is released with `set_free`.
//! Busy state can be scoped per resource (for example per target site), and
//! [`ProxyList`] keeps separate IPv4 and IPv6 pools.

pub mod config;
pub mod error;
pub mod lease;
pub mod list;
pub mod pool;
pub mod proxy;
pub mod simple;
mod utils;

pub use config::{EmptyLoadPolicy, ProxyPoolConfig, ProxyPoolConfigBuilder};
pub use error::{Error, Result};
pub use lease::ProxyLease;
pub use list::{Family, ProxyList};
pub use pool::ProxyPool;
pub use proxy::Proxy;
pub use simple::{SimpleProxyPool, DEFAULT_RESOURCE};
pub use url::Url;
