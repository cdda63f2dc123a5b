//! Implementation of the `wpm remove` command.
//!
//! Only the configuration entry is removed. Installed directories stay on disk.

use std::path::Path;

use anyhow::{Context, Result};

use wpm_lib::config::Config;

use crate::output::{print_success, print_warning};

pub fn cmd_remove(config_path: &Path, install: Option<&Path>, name: &str) -> Result<()> {
  let mut config = Config::load(config_path).context("Failed to load configuration")?;
  let installation = config.installation_mut(install)?;

  let removed = installation.remove_addon(name)?;
  config.save(config_path).context("Failed to save configuration")?;

  print_success(&format!("Removed {}", removed.name));
  if !removed.owned_dirs.is_empty() {
    let owns: Vec<&str> = removed.owned_dirs.iter().map(String::as_str).collect();
    print_warning(&format!("Left on disk: {}", owns.join(", ")));
  }

  Ok(())
}
