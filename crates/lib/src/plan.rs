//! Change planning.
//!
//! Turns an addon's previously owned directories and its freshly fetched
//! package into an ordered list of [`Change`]s. Archive addons are replaced
//! wholesale: every owned tree is removed, then the archive's directory
//! structure is recreated and its files written. The order is load-bearing:
//!
//! 1. `RemoveTree` for each previously owned directory (and any new top-level
//!    directory not owned before)
//! 2. `MakeDir` for every directory implied by the archive, parents first
//! 3. `WriteFile` for every file, in archive order

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::addon::{AddonSpec, SourceKind};
use crate::archive::Archive;
use crate::change::Change;
use crate::fetch::FetchedPackage;

/// Errors that prevent a plan from being computed.
#[derive(Debug, Error)]
pub enum PlanError {
  /// An archive entry would be written outside the installation directory.
  #[error("archive entry '{path}' escapes the installation directory")]
  UnsafeEntry { path: String },

  /// The fetched package does not fit the addon's source kind.
  #[error("{kind} addon '{name}' cannot be installed from {package} contents")]
  KindMismatch {
    name: String,
    kind: SourceKind,
    package: &'static str,
  },

  /// A `link` addon has no location to link from.
  #[error("link addon '{name}' has no location")]
  MissingLocation { name: String },
}

/// Compute the ordered changes that install `package` for `spec` under `base`.
///
/// `previous` is the set of top-level directories the addon owned before this
/// run; they are cleared before anything is created.
pub fn plan_changes(
  spec: &AddonSpec,
  previous: &BTreeSet<String>,
  package: &FetchedPackage,
  base: &Path,
) -> Result<Vec<Change>, PlanError> {
  let changes = match (spec.kind, package) {
    (SourceKind::Ignore, _) => Vec::new(),
    (SourceKind::Link, FetchedPackage::Static { .. }) => plan_link(spec, base)?,
    (SourceKind::Curse | SourceKind::WowAce, FetchedPackage::Archive { archive, owned_dirs }) => {
      plan_archive(previous, archive, owned_dirs, base)?
    }
    (kind, package) => {
      return Err(PlanError::KindMismatch {
        name: spec.name.clone(),
        kind,
        package: match package {
          FetchedPackage::Archive { .. } => "archive",
          FetchedPackage::Static { .. } => "static",
        },
      });
    }
  };

  debug!(addon = %spec.name, changes = changes.len(), "planned changes");
  Ok(changes)
}

fn plan_link(spec: &AddonSpec, base: &Path) -> Result<Vec<Change>, PlanError> {
  let location = spec.location.as_ref().ok_or_else(|| PlanError::MissingLocation {
    name: spec.name.clone(),
  })?;
  let dest = base.join(&spec.name);

  Ok(vec![
    Change::RemoveTree { path: dest.clone() },
    Change::Link {
      source: PathBuf::from(location),
      dest,
    },
  ])
}

fn plan_archive(
  previous: &BTreeSet<String>,
  archive: &Archive,
  owned_dirs: &BTreeSet<String>,
  base: &Path,
) -> Result<Vec<Change>, PlanError> {
  if let Some(entry) = archive.entries().iter().find(|entry| !entry.is_safe()) {
    return Err(PlanError::UnsafeEntry {
      path: entry.path.clone(),
    });
  }

  let dirs = creation_dirs(archive);
  let mut changes = Vec::with_capacity(previous.len() + dirs.len() + archive.len());

  let removals = previous.iter().chain(owned_dirs.difference(previous));
  for dir in removals {
    changes.push(Change::RemoveTree {
      path: install_path(base, dir),
    });
  }

  for dir in &dirs {
    changes.push(Change::MakeDir {
      path: install_path(base, dir),
    });
  }

  for entry in archive.files() {
    changes.push(Change::WriteFile {
      path: install_path(base, &entry.path),
      content: entry.content.clone(),
    });
  }

  Ok(changes)
}

/// Every directory the archive implies, sorted so parents precede children.
///
/// This covers directory entries themselves and all ancestors of every entry,
/// unlike [`Archive::top_level_dirs`] which only reports first segments.
/// Byte-wise ordering of `/`-separated paths always puts a path before any
/// path it prefixes.
pub fn creation_dirs(archive: &Archive) -> BTreeSet<String> {
  let mut dirs = BTreeSet::new();

  for entry in archive.entries() {
    if entry.is_root() {
      continue;
    }

    let mut current = if entry.is_dir {
      Some(entry.path.as_str())
    } else {
      parent_of(&entry.path)
    };

    while let Some(dir) = current {
      // Ancestors of a known directory are already recorded.
      if !dirs.insert(dir.to_string()) {
        break;
      }
      current = parent_of(dir);
    }
  }

  dirs
}

fn parent_of(path: &str) -> Option<&str> {
  path.rsplit_once('/').map(|(parent, _)| parent).filter(|p| !p.is_empty())
}

/// Join a forward-slash relative path onto `base` segment by segment.
fn install_path(base: &Path, relative: &str) -> PathBuf {
  relative
    .split('/')
    .filter(|segment| !segment.is_empty())
    .fold(base.to_path_buf(), |path, segment| path.join(segment))
}
