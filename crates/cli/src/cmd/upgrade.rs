//! Implementation of the `wpm upgrade` command.
//!
//! Fetches the newest archive of every addon in an installation, replaces the
//! directories each addon owns and records the new ownership in the
//! configuration file.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::info;

use wpm_lib::config::Config;
use wpm_lib::index::HttpIndex;
use wpm_lib::upgrade::{AddonStatus, UpgradeOptions, UpgradeReport, upgrade};

use crate::output::{format_duration, print_change, print_error, print_info, print_success, print_warning};

/// Execute the upgrade command.
///
/// The configuration is saved after every non-dry run, including runs where
/// some addons failed, so that successfully installed addons keep their new
/// ownership.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or saved, or if any
/// addon failed.
pub fn cmd_upgrade(config_path: &Path, install: Option<&Path>, dry_run: bool, jobs: Option<usize>) -> Result<()> {
  let mut config = Config::load(config_path).context("Failed to load configuration")?;
  let installation = config.installation_mut(install)?;

  let mut options = UpgradeOptions {
    dry_run,
    ..Default::default()
  };
  if let Some(jobs) = jobs {
    options.parallelism = jobs.max(1);
  }

  print_info(&format!(
    "Upgrading {} addon(s) in {}",
    installation.addons.len(),
    installation.dir.display()
  ));

  let started = Instant::now();
  let index = Arc::new(HttpIndex::new());
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(upgrade(installation, index, &options));
  let elapsed = started.elapsed();

  print_report(&report);

  if !dry_run {
    config.save(config_path).context("Failed to save configuration")?;
    info!(path = %config_path.display(), "configuration saved");
  }

  println!();
  if report.is_success() {
    let verb = if dry_run { "Planned" } else { "Upgraded" };
    print_success(&format!(
      "{} {} addon(s) in {}",
      verb,
      report.addons.len(),
      format_duration(elapsed)
    ));
    Ok(())
  } else {
    bail!(
      "{} of {} addon(s) failed",
      report.failed_count(),
      report.addons.len()
    );
  }
}

fn print_report(report: &UpgradeReport) {
  for addon in &report.addons {
    match &addon.status {
      AddonStatus::Applied { committed, failures } if failures.is_empty() => {
        print_success(&format!("{}: {} change(s) applied", addon.name, committed));
      }
      AddonStatus::Applied { committed, failures } => {
        print_error(&format!(
          "{}: {} change(s) applied, {} failed",
          addon.name,
          committed,
          failures.len()
        ));
        for failure in failures {
          eprintln!("    {}", failure);
        }
      }
      AddonStatus::Planned { changes } if changes.is_empty() => {
        print_info(&format!("{}: nothing to do", addon.name));
      }
      AddonStatus::Planned { changes } => {
        print_warning(&format!("{}: {} change(s) planned (dry run)", addon.name, changes.len()));
        for change in changes {
          print_change(change);
        }
      }
      AddonStatus::Failed(e) => {
        print_error(&format!("{}: {}", addon.name, e));
      }
    }
  }
}
