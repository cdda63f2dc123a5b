//! Remote package indexes.
//!
//! A [`PackageIndex`] turns an addon name and a [`Remote`] into the bytes of
//! the most recent downloadable archive. The pipeline only depends on this
//! trait; [`HttpIndex`] is the implementation that talks to the project sites.

mod http;

use std::future::Future;

use thiserror::Error;

use crate::addon::Remote;

pub use http::{HttpIndex, find_download_href};

/// Errors that can occur while looking up or downloading an archive.
#[derive(Debug, Error)]
pub enum IndexError {
  /// The remote has no downloadable archive for this addon.
  #[error("no downloadable archive for '{name}' on {remote}")]
  NotFound { name: String, remote: Remote },

  /// The request could not be sent or its body could not be read.
  #[error("request to {url} failed: {source}")]
  Http {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The host of a remote cannot carry a path, e.g. `mailto:` or `data:` URLs.
  #[error("host '{host}' cannot be used as a base URL")]
  InvalidHost { host: String },

  /// A download link in a listing page is not a valid URL reference.
  #[error("invalid download link '{href}': {source}")]
  InvalidHref {
    href: String,
    #[source]
    source: url::ParseError,
  },

  /// The server answered with a non-success status.
  #[error("request to {url} returned HTTP {status}")]
  Status { url: String, status: u16 },
}

/// Source of addon archives.
pub trait PackageIndex: Send + Sync {
  /// Download the most recent archive of `name` from `remote`.
  fn latest_archive(&self, name: &str, remote: Remote) -> impl Future<Output = Result<Vec<u8>, IndexError>> + Send;
}
