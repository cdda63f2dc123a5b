//! Addon specifications.
//!
//! An [`AddonSpec`] is one entry of an installation's addon list: the addon's
//! name, where it comes from, and the top-level directories it currently owns
//! under the installation directory.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A remote archive index an addon can be downloaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Remote {
  Curse,
  WowAce,
}

impl Remote {
  pub fn as_str(self) -> &'static str {
    match self {
      Remote::Curse => "curse",
      Remote::WowAce => "wowace",
    }
  }
}

impl fmt::Display for Remote {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Where an addon's contents come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
  /// Latest archive from the CurseForge project listing.
  Curse,
  /// Latest archive from the WowAce project listing.
  #[serde(rename = "wowace")]
  WowAce,
  /// Tracked by name only; never touched on disk.
  Ignore,
  /// Linked from a local directory given by `location`.
  Link,
}

impl SourceKind {
  /// The remote index for archive-backed kinds.
  pub fn remote(self) -> Option<Remote> {
    match self {
      SourceKind::Curse => Some(Remote::Curse),
      SourceKind::WowAce => Some(Remote::WowAce),
      SourceKind::Ignore | SourceKind::Link => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      SourceKind::Curse => "curse",
      SourceKind::WowAce => "wowace",
      SourceKind::Ignore => "ignore",
      SourceKind::Link => "link",
    }
  }
}

impl fmt::Display for SourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Returned when parsing an unknown source kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown addon type '{0}', expected one of: curse, wowace, ignore, link")]
pub struct UnknownSourceKind(pub String);

impl FromStr for SourceKind {
  type Err = UnknownSourceKind;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "curse" => Ok(SourceKind::Curse),
      "wowace" => Ok(SourceKind::WowAce),
      "ignore" => Ok(SourceKind::Ignore),
      "link" => Ok(SourceKind::Link),
      _ => Err(UnknownSourceKind(s.to_string())),
    }
  }
}

/// One addon's identity, provenance and ownership record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonSpec {
  /// Package identifier on the remote, and the directory name for `link`/`ignore`.
  pub name: String,

  #[serde(rename = "type")]
  pub kind: SourceKind,

  /// Local directory a `link` addon points at.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,

  /// Release branch; recorded but not used when fetching.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub branch: Option<String>,

  /// Top-level directories this addon controls under the installation dir.
  ///
  /// Replaced after every successful upgrade and used as the set of
  /// directories to clear on the next one.
  #[serde(default, rename = "owns", skip_serializing_if = "BTreeSet::is_empty")]
  pub owned_dirs: BTreeSet<String>,
}

impl AddonSpec {
  pub fn new(name: impl Into<String>, kind: SourceKind) -> Self {
    Self {
      name: name.into(),
      kind,
      location: None,
      branch: None,
      owned_dirs: BTreeSet::new(),
    }
  }

  pub fn with_location(mut self, location: impl Into<String>) -> Self {
    self.location = Some(location.into());
    self
  }

  pub fn with_owned_dirs<I, S>(mut self, dirs: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.owned_dirs = dirs.into_iter().map(Into::into).collect();
    self
  }
}
