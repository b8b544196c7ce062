//! Error types for the proxy-busy-pool crate.

use std::convert::Infallible;
use thiserror::Error;

/// Errors raised while obtaining a proxy list.
///
/// Malformed lines, unknown addresses and empty lists are not errors; they are
/// reported as data or handled as no-ops by the pool.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading a file or stream failed.
    #[error("failed to read proxy list: {0}")]
    Io(#[from] std::io::Error),
    /// Fetching a proxy list over HTTP failed.
    #[error("failed to fetch proxy list: {0}")]
    Fetch(#[from] reqwest::Error),
    /// The address family tag is not IPv4 or IPv6.
    #[error("unknown address family: {0}")]
    UnknownFamily(String),
    /// A refresh was requested but no source is configured.
    #[error("no proxy list source configured")]
    NoSources,
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

pub type Result<T> = std::result::Result<T, Error>;
