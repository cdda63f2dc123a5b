//! Implementation of the `wpm init` command.
//!
//! Writes a configuration file holding a single, empty installation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use wpm_lib::config::Config;
use wpm_lib::platform::paths;

use crate::output::symbols;

/// Execute the init command.
///
/// The installation directory defaults to the platform's AddOns directory.
/// An existing configuration is only replaced when `force` is set.
pub fn cmd_init(config_path: &Path, dir: Option<PathBuf>, force: bool) -> Result<()> {
  let dir = dir.unwrap_or_else(paths::default_install_dir);

  Config::init(config_path, &dir, force).context("Failed to initialize configuration")?;

  println!(
    "{} {}",
    symbols::SUCCESS.green(),
    "Initialized wpm configuration!".green().bold()
  );
  println!();
  println!("  {} Config file:  {}", symbols::INFO.cyan(), config_path.display());
  println!("  {} Installation: {}", symbols::INFO.cyan(), dir.display());
  println!();
  println!("{}", "Next steps:".bold());
  println!(
    "  1. Run: {}",
    "wpm add --name <project> --type curse".cyan()
  );
  println!("  2. Run: {}", "wpm upgrade".cyan());

  Ok(())
}
