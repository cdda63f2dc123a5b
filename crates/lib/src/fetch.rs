//! Resolving an addon's source into package contents.
//!
//! Fetching never touches the installation directory. It produces a
//! [`FetchedPackage`] holding everything the planner needs, including the new
//! set of top-level directories the addon will own.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, info};

use crate::addon::{AddonSpec, Remote, SourceKind};
use crate::archive::{Archive, ArchiveError};
use crate::index::{IndexError, PackageIndex};

/// Errors that can occur while fetching an addon.
#[derive(Debug, Error)]
pub enum FetchError {
  /// The archive could not be located or downloaded.
  #[error(transparent)]
  Index(#[from] IndexError),

  /// The downloaded bytes are not a usable archive.
  #[error("invalid archive: {0}")]
  Archive(#[from] ArchiveError),

  /// A `link` addon has no location to link from.
  #[error("link addon '{name}' has no location")]
  MissingLocation { name: String },
}

/// The contents of an addon for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedPackage {
  /// A downloaded archive and the top-level directories it creates.
  Archive {
    archive: Archive,
    owned_dirs: BTreeSet<String>,
  },
  /// No contents to install; ownership is the addon's own name.
  Static { owned_dirs: BTreeSet<String> },
}

impl FetchedPackage {
  /// Directories the addon owns once this package is installed.
  pub fn owned_dirs(&self) -> &BTreeSet<String> {
    match self {
      FetchedPackage::Archive { owned_dirs, .. } | FetchedPackage::Static { owned_dirs } => owned_dirs,
    }
  }

  /// Build an archive package, deriving ownership from its entries.
  pub fn from_archive(archive: Archive) -> Self {
    let owned_dirs = archive.top_level_dirs();
    FetchedPackage::Archive { archive, owned_dirs }
  }

  fn named(name: &str) -> Self {
    FetchedPackage::Static {
      owned_dirs: BTreeSet::from([name.to_string()]),
    }
  }
}

/// Fetch the current contents of `spec`.
///
/// Only archive-backed kinds do any I/O. `ignore` and `link` addons own the
/// directory named after them and have nothing to download.
pub async fn fetch_addon<I: PackageIndex>(spec: &AddonSpec, index: &I) -> Result<FetchedPackage, FetchError> {
  if let Some(remote) = spec.kind.remote() {
    return fetch_archive(spec, remote, index).await;
  }

  if spec.kind == SourceKind::Link && spec.location.is_none() {
    return Err(FetchError::MissingLocation {
      name: spec.name.clone(),
    });
  }

  debug!(addon = %spec.name, kind = %spec.kind, "nothing to fetch");
  Ok(FetchedPackage::named(&spec.name))
}

async fn fetch_archive<I: PackageIndex>(
  spec: &AddonSpec,
  remote: Remote,
  index: &I,
) -> Result<FetchedPackage, FetchError> {
  let bytes = index.latest_archive(&spec.name, remote).await?;
  let archive = Archive::from_zip_bytes(&bytes)?;
  let package = FetchedPackage::from_archive(archive);

  info!(
    addon = %spec.name,
    %remote,
    dirs = ?package.owned_dirs(),
    "fetched archive"
  );
  Ok(package)
}
