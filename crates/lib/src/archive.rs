//! Archive decoding and ownership inspection.
//!
//! Addon releases are zip archives whose top-level directories are the
//! folders that end up in the installation directory. [`Archive`] keeps the
//! decoded entries in archive order and derives the set of top-level
//! directories an addon owns once installed.

use std::collections::BTreeSet;
use std::io::{Cursor, Read};

use thiserror::Error;
use tracing::debug;

/// Upper bound on the buffer reserved up front for one entry.
const MAX_PREALLOC: u64 = 1 << 20;

/// Errors that can occur while decoding an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
  /// The bytes are not a readable zip archive.
  #[error("failed to open zip archive: {0}")]
  Open(#[source] zip::result::ZipError),

  /// An entry's header or data could not be read.
  #[error("failed to read archive entry #{index}: {source}")]
  Entry {
    index: usize,
    #[source]
    source: zip::result::ZipError,
  },

  /// An entry's content could not be decompressed.
  #[error("failed to decompress '{path}': {source}")]
  Content {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

/// A single decoded archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
  /// Forward-slash path relative to the archive root, without trailing `/`.
  pub path: String,
  pub is_dir: bool,
  /// File content; always empty for directories.
  pub content: Vec<u8>,
}

impl ArchiveEntry {
  pub fn file(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
    Self {
      path: normalize_entry_path(&path.into()),
      is_dir: false,
      content: content.into(),
    }
  }

  pub fn dir(path: impl Into<String>) -> Self {
    Self {
      path: normalize_entry_path(&path.into()),
      is_dir: true,
      content: Vec::new(),
    }
  }

  /// Whether this entry is the archive root itself.
  pub fn is_root(&self) -> bool {
    self.path.is_empty() || self.path == "."
  }

  /// First path component below the archive root.
  pub fn top_level(&self) -> Option<&str> {
    if self.is_root() {
      return None;
    }
    self.path.split('/').find(|segment| !segment.is_empty())
  }

  /// Whether the entry stays inside the directory it is extracted into.
  pub fn is_safe(&self) -> bool {
    !self.path.starts_with('/')
      && self
        .path
        .split('/')
        .all(|segment| segment != ".." && !segment.contains(':'))
  }
}

/// A decoded addon archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
  entries: Vec<ArchiveEntry>,
}

impl Archive {
  pub fn new(entries: Vec<ArchiveEntry>) -> Self {
    Self { entries }
  }

  /// Decode an in-memory zip archive, preserving entry order.
  pub fn from_zip_bytes(bytes: &[u8]) -> Result<Self, ArchiveError> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).map_err(ArchiveError::Open)?;
    let mut entries = Vec::with_capacity(zip.len());

    for index in 0..zip.len() {
      let mut file = zip
        .by_index(index)
        .map_err(|source| ArchiveError::Entry { index, source })?;

      let path = normalize_entry_path(file.name());
      if path.is_empty() {
        continue;
      }

      if file.is_dir() {
        entries.push(ArchiveEntry {
          path,
          is_dir: true,
          content: Vec::new(),
        });
        continue;
      }

      // The declared size comes from an untrusted header.
      let mut content = Vec::with_capacity(file.size().min(MAX_PREALLOC) as usize);
      file
        .read_to_end(&mut content)
        .map_err(|source| ArchiveError::Content {
          path: path.clone(),
          source,
        })?;

      entries.push(ArchiveEntry {
        path,
        is_dir: false,
        content,
      });
    }

    debug!(entries = entries.len(), "decoded archive");
    Ok(Self { entries })
  }

  pub fn entries(&self) -> &[ArchiveEntry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// The distinct top-level segments of all entries, root excluded.
  pub fn top_level_dirs(&self) -> BTreeSet<String> {
    self
      .entries
      .iter()
      .filter_map(ArchiveEntry::top_level)
      .map(str::to_string)
      .collect()
  }

  /// File entries in archive order.
  pub fn files(&self) -> impl Iterator<Item = &ArchiveEntry> {
    self.entries.iter().filter(|entry| !entry.is_dir)
  }
}

/// Normalize a zip entry name to a forward-slash path.
///
/// Backslashes become separators, `.` and empty segments are dropped and a
/// leading `/` is kept so that absolute names can be rejected later.
fn normalize_entry_path(raw: &str) -> String {
  let unified = raw.replace('\\', "/");
  let joined = unified
    .split('/')
    .filter(|segment| !segment.is_empty() && *segment != ".")
    .collect::<Vec<_>>()
    .join("/");

  if unified.starts_with('/') && !joined.is_empty() {
    format!("/{}", joined)
  } else {
    joined
  }
}
