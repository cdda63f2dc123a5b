//! Committable filesystem changes.
//!
//! A [`Change`] is one atomic operation of an upgrade plan. Plans are ordered
//! so that every change only depends on changes that precede it: trees are
//! removed before they are recreated and directories exist before files are
//! written into them.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::trace;

/// A single filesystem operation.
#[derive(Clone, PartialEq, Eq)]
pub enum Change {
  /// Recursively delete `path`. Succeeds if nothing exists there.
  RemoveTree { path: PathBuf },
  /// Create one directory; its parent must already exist.
  MakeDir { path: PathBuf },
  /// Create or overwrite a file; its parent must already exist.
  WriteFile { path: PathBuf, content: Vec<u8> },
  /// Make `dest` refer to the directory at `source`.
  Link { source: PathBuf, dest: PathBuf },
}

/// A change that could not be committed.
#[derive(Debug, Error)]
#[error("failed to {action} '{}': {source}", .path.display())]
pub struct CommitError {
  pub action: &'static str,
  pub path: PathBuf,
  #[source]
  pub source: io::Error,
}

impl Change {
  /// The path this change modifies.
  pub fn path(&self) -> &Path {
    match self {
      Change::RemoveTree { path } | Change::MakeDir { path } | Change::WriteFile { path, .. } => path,
      Change::Link { dest, .. } => dest,
    }
  }

  /// Short verb describing the operation.
  pub fn action(&self) -> &'static str {
    match self {
      Change::RemoveTree { .. } => "remove",
      Change::MakeDir { .. } => "create directory",
      Change::WriteFile { .. } => "write",
      Change::Link { .. } => "link",
    }
  }

  /// Perform the change on disk.
  pub fn commit(&self) -> Result<(), CommitError> {
    trace!(change = %self, "committing");

    let result = match self {
      Change::RemoveTree { path } => remove_tree(path),
      Change::MakeDir { path } => fs::create_dir(path),
      Change::WriteFile { path, content } => fs::write(path, content),
      Change::Link { source, dest } => create_link(source, dest),
    };

    result.map_err(|source| CommitError {
      action: self.action(),
      path: self.path().to_path_buf(),
      source,
    })
  }
}

impl fmt::Display for Change {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Change::RemoveTree { path } => write!(f, "rmtree {}", path.display()),
      Change::MakeDir { path } => write!(f, "mkdir {}", path.display()),
      Change::WriteFile { path, content } => write!(f, "write {} ({} bytes)", path.display(), content.len()),
      Change::Link { source, dest } => write!(f, "link {} -> {}", dest.display(), source.display()),
    }
  }
}

impl fmt::Debug for Change {
  // File contents are elided so plans stay readable in assertion output.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Change::RemoveTree { path } => f.debug_tuple("RemoveTree").field(path).finish(),
      Change::MakeDir { path } => f.debug_tuple("MakeDir").field(path).finish(),
      Change::WriteFile { path, content } => f
        .debug_struct("WriteFile")
        .field("path", path)
        .field("len", &content.len())
        .finish(),
      Change::Link { source, dest } => f.debug_tuple("Link").field(source).field(dest).finish(),
    }
  }
}

/// Remove whatever is at `path`: a directory tree, a file or a link.
fn remove_tree(path: &Path) -> io::Result<()> {
  let metadata = match fs::symlink_metadata(path) {
    Ok(metadata) => metadata,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
    Err(e) => return Err(e),
  };

  let file_type = metadata.file_type();
  if file_type.is_dir() {
    fs::remove_dir_all(path)
  } else if file_type.is_symlink() {
    remove_link(path)
  } else {
    fs::remove_file(path)
  }
}

#[cfg(unix)]
fn remove_link(path: &Path) -> io::Result<()> {
  fs::remove_file(path)
}

#[cfg(windows)]
fn remove_link(path: &Path) -> io::Result<()> {
  // Directory symlinks must be removed as directories on Windows.
  fs::remove_dir(path).or_else(|_| fs::remove_file(path))
}

#[cfg(unix)]
fn create_link(source: &Path, dest: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(source, dest)
}

#[cfg(windows)]
fn create_link(source: &Path, dest: &Path) -> io::Result<()> {
  if source.is_dir() {
    std::os::windows::fs::symlink_dir(source, dest)
  } else {
    std::os::windows::fs::symlink_file(source, dest)
  }
}
