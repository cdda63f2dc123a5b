//! Types for upgrade runs.
//!
//! This module defines the options, per-addon outcomes and the aggregated
//! report returned by [`super::upgrade`].

use std::collections::BTreeSet;

use thiserror::Error;

use crate::change::{Change, CommitError};
use crate::fetch::FetchError;
use crate::plan::PlanError;

/// Reasons an addon was skipped before any of its changes were committed.
#[derive(Debug, Error)]
pub enum AddonError {
  /// The package could not be fetched; the addon is left untouched.
  #[error("fetch failed: {0}")]
  Fetch(#[from] FetchError),

  /// Another addon claims some of the same directories.
  #[error("directories {dirs:?} are also claimed by {with:?}")]
  Conflict {
    dirs: BTreeSet<String>,
    with: BTreeSet<String>,
  },

  /// The fetched package could not be turned into a plan.
  #[error("plan failed: {0}")]
  Plan(#[from] PlanError),

  /// The worker task panicked or was cancelled.
  #[error("task failed: {0}")]
  Task(String),
}

/// What happened to a single addon during a run.
#[derive(Debug)]
pub enum AddonStatus {
  /// Changes were committed in order. Failed changes did not stop the
  /// remaining ones and nothing was rolled back.
  Applied {
    committed: usize,
    failures: Vec<CommitError>,
  },

  /// Dry run: the changes that would have been committed.
  Planned { changes: Vec<Change> },

  /// Skipped before committing anything.
  Failed(AddonError),
}

impl AddonStatus {
  pub fn is_success(&self) -> bool {
    match self {
      AddonStatus::Applied { failures, .. } => failures.is_empty(),
      AddonStatus::Planned { .. } => true,
      AddonStatus::Failed(_) => false,
    }
  }
}

/// Outcome for one addon, named for reporting.
#[derive(Debug)]
pub struct AddonReport {
  pub name: String,
  pub status: AddonStatus,
}

/// Result of upgrading an installation, in addon declaration order.
#[derive(Debug, Default)]
pub struct UpgradeReport {
  pub addons: Vec<AddonReport>,
}

impl UpgradeReport {
  /// Returns true if every addon was planned or applied without failures.
  pub fn is_success(&self) -> bool {
    self.addons.iter().all(|a| a.status.is_success())
  }

  /// Number of addons with any failure.
  pub fn failed_count(&self) -> usize {
    self.addons.iter().filter(|a| !a.status.is_success()).count()
  }

  /// Total number of changes committed across all addons.
  pub fn committed_count(&self) -> usize {
    self
      .addons
      .iter()
      .map(|a| match &a.status {
        AddonStatus::Applied { committed, .. } => *committed,
        _ => 0,
      })
      .sum()
  }

  pub fn get(&self, name: &str) -> Option<&AddonStatus> {
    self.addons.iter().find(|a| a.name == name).map(|a| &a.status)
  }
}

/// Configuration for an upgrade run.
#[derive(Debug, Clone)]
pub struct UpgradeOptions {
  /// Maximum number of addons processed concurrently in each phase.
  pub parallelism: usize,

  /// Plan without committing or updating ownership.
  pub dry_run: bool,
}

impl Default for UpgradeOptions {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      dry_run: false,
    }
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
