//! Implementation of the `wpm add` command.

use std::path::Path;

use anyhow::{Context, Result, bail};

use wpm_lib::addon::{AddonSpec, SourceKind};
use wpm_lib::config::Config;

use crate::output::print_success;

/// Addon fields collected from the command line.
pub struct AddArgs {
  pub name: String,
  pub kind: SourceKind,
  pub location: Option<String>,
  pub branch: Option<String>,
}

/// Append an addon to an installation. Nothing is downloaded until the next upgrade.
pub fn cmd_add(config_path: &Path, install: Option<&Path>, args: AddArgs) -> Result<()> {
  if args.kind == SourceKind::Link && args.location.is_none() {
    bail!("link addons need --location");
  }

  let mut config = Config::load(config_path).context("Failed to load configuration")?;
  let installation = config.installation_mut(install)?;

  let mut spec = AddonSpec::new(&args.name, args.kind);
  spec.location = args.location;
  spec.branch = args.branch;

  installation.add_addon(spec)?;
  let dir = installation.dir.clone();

  config.save(config_path).context("Failed to save configuration")?;
  print_success(&format!("Added {} ({}) to {}", args.name, args.kind, dir.display()));

  Ok(())
}
