//! Implementation of the `wpm list` command.

use std::path::Path;

use anyhow::{Context, Result};

use wpm_lib::config::Config;

use crate::output::{OutputFormat, print_info, print_json, print_stat, symbols};

pub fn cmd_list(config_path: &Path, install: Option<&Path>, format: OutputFormat) -> Result<()> {
  let config = Config::load(config_path).context("Failed to load configuration")?;
  let installation = config.installation(install)?;

  if format.is_json() {
    return print_json(installation);
  }

  print_info(&format!("Installation: {}", installation.dir.display()));
  if installation.addons.is_empty() {
    println!("  No addons configured. Run 'wpm add' to add one.");
    return Ok(());
  }

  for addon in &installation.addons {
    println!();
    println!("  {} {} ({})", symbols::INFO, addon.name, addon.kind);
    if let Some(location) = &addon.location {
      print_stat("Location", location);
    }
    if let Some(branch) = &addon.branch {
      print_stat("Branch", branch);
    }
    if !addon.owned_dirs.is_empty() {
      let owns: Vec<&str> = addon.owned_dirs.iter().map(String::as_str).collect();
      print_stat("Owns", &owns.join(", "));
    }
  }

  Ok(())
}
