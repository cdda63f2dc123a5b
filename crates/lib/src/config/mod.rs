//! Configuration store.
//!
//! The configuration file (`wpm.yaml`) lists installations and the addons
//! managed in each of them:
//!
//! ```yaml
//! installations:
//! - dir: C:\Program Files (x86)\World of Warcraft\Interface\AddOns
//!   addons:
//!   - name: deadly-boss-mods
//!     type: curse
//!     owns:
//!     - DBM-Core
//!     - DBM-GUI
//!   - name: MyAddon
//!     type: link
//!     location: D:\dev\MyAddon
//! ```
//!
//! `owns` is written back after each upgrade so the next run knows which
//! directories to clear. Archive contents are never stored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::addon::AddonSpec;

/// Errors that can occur when working with the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The configuration file does not exist.
  #[error("config file not found: {}", .0.display())]
  NotFound(PathBuf),

  /// The configuration file already exists and would be overwritten.
  #[error("config file already exists: {}", .0.display())]
  AlreadyExists(PathBuf),

  /// Failed to read the configuration file.
  #[error("failed to read config file '{}': {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The configuration file is not valid YAML for this schema.
  #[error("failed to parse config file '{}': {source}", .path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  /// Failed to serialize the configuration.
  #[error("failed to serialize config: {0}")]
  Serialize(#[source] serde_yaml::Error),

  /// Failed to write the configuration file.
  #[error("failed to write config file '{}': {source}", .path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The configuration has no installations.
  #[error("no installations configured")]
  NoInstallations,

  /// No installation is configured for the given directory.
  #[error("no installation configured at '{}'", .0.display())]
  UnknownInstallation(PathBuf),

  /// An addon with this name is already managed in the installation.
  #[error("addon '{name}' is already managed in '{}'", .dir.display())]
  DuplicateAddon { name: String, dir: PathBuf },

  /// No addon with this name is managed in the installation.
  #[error("addon '{name}' is not managed in '{}'", .dir.display())]
  AddonNotFound { name: String, dir: PathBuf },
}

/// The complete configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub installations: Vec<Installation>,
}

/// A target directory and the addons managed in it, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
  pub dir: PathBuf,
  #[serde(default)]
  pub addons: Vec<AddonSpec>,
}

impl Installation {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self {
      dir: dir.into(),
      addons: Vec::new(),
    }
  }

  pub fn addon(&self, name: &str) -> Option<&AddonSpec> {
    self.addons.iter().find(|a| a.name == name)
  }

  /// Append an addon, rejecting duplicate names.
  pub fn add_addon(&mut self, spec: AddonSpec) -> Result<(), ConfigError> {
    if self.addon(&spec.name).is_some() {
      return Err(ConfigError::DuplicateAddon {
        name: spec.name,
        dir: self.dir.clone(),
      });
    }
    self.addons.push(spec);
    Ok(())
  }

  /// Stop managing an addon. Files on disk are left alone.
  pub fn remove_addon(&mut self, name: &str) -> Result<AddonSpec, ConfigError> {
    let position = self
      .addons
      .iter()
      .position(|a| a.name == name)
      .ok_or_else(|| ConfigError::AddonNotFound {
        name: name.to_string(),
        dir: self.dir.clone(),
      })?;
    Ok(self.addons.remove(position))
  }
}

impl Config {
  /// A configuration with a single, empty installation at `dir`.
  pub fn with_installation(dir: impl Into<PathBuf>) -> Self {
    Self {
      installations: vec![Installation::new(dir)],
    }
  }

  /// Load the configuration from `path`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ConfigError::NotFound(path.to_path_buf())),
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    let config = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    debug!(path = %path.display(), "loaded config");
    Ok(config)
  }

  /// Save the configuration to `path`, creating parent directories.
  pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
    let content = serde_yaml::to_string(self).map_err(ConfigError::Serialize)?;
    let write_err = |source: io::Error| ConfigError::Write {
      path: path.to_path_buf(),
      source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, content).map_err(write_err)?;

    debug!(path = %path.display(), "saved config");
    Ok(())
  }

  /// Write a fresh configuration with one installation at `dir`.
  ///
  /// Fails if `path` already exists unless `force` is set.
  pub fn init(path: &Path, dir: impl Into<PathBuf>, force: bool) -> Result<Self, ConfigError> {
    if !force && path.exists() {
      return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    let config = Self::with_installation(dir);
    config.save(path)?;
    Ok(config)
  }

  /// The installation at `dir`, or the first one when `dir` is `None`.
  pub fn installation(&self, dir: Option<&Path>) -> Result<&Installation, ConfigError> {
    let index = self.installation_index(dir)?;
    Ok(&self.installations[index])
  }

  /// Mutable variant of [`Config::installation`].
  pub fn installation_mut(&mut self, dir: Option<&Path>) -> Result<&mut Installation, ConfigError> {
    let index = self.installation_index(dir)?;
    Ok(&mut self.installations[index])
  }

  fn installation_index(&self, dir: Option<&Path>) -> Result<usize, ConfigError> {
    match dir {
      None if self.installations.is_empty() => Err(ConfigError::NoInstallations),
      None => Ok(0),
      Some(dir) => self
        .installations
        .iter()
        .position(|i| i.dir == dir)
        .ok_or_else(|| ConfigError::UnknownInstallation(dir.to_path_buf())),
    }
  }
}
