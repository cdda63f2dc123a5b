use std::path::PathBuf;

use crate::consts::{APP_NAME, CONFIG_FILENAME};
#[cfg(windows)]
use crate::consts::WINDOWS_ADDONS_DIR;

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var("USERPROFILE")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var("HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the directory for configuration files for the application
#[cfg(windows)]
pub fn config_dir() -> PathBuf {
  std::env::var("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join("AppData").join("Roaming"))
    .join(APP_NAME)
}

/// Returns the directory for configuration files for the application
#[cfg(not(windows))]
pub fn config_dir() -> PathBuf {
  let config_home = std::env::var("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".config"));
  config_home.join(APP_NAME)
}

/// Returns the directory for data files for the application
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  let data_home = std::env::var("XDG_DATA_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".local").join("share"));
  data_home.join(APP_NAME)
}

/// Default location of the configuration file.
pub fn config_file() -> PathBuf {
  config_dir().join(CONFIG_FILENAME)
}

/// Default AddOns directory written by `init` when none is given.
#[cfg(windows)]
pub fn default_install_dir() -> PathBuf {
  PathBuf::from(WINDOWS_ADDONS_DIR)
}

/// Default AddOns directory written by `init` when none is given.
#[cfg(not(windows))]
pub fn default_install_dir() -> PathBuf {
  data_dir().join("AddOns")
}
