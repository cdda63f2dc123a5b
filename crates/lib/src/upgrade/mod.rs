//! Upgrade orchestration.
//!
//! Runs the fetch → plan → commit pipeline over every addon of one
//! installation in strictly ordered phases:
//!
//! 1. Fetch: one task per addon, followed by a full barrier
//! 2. Validate: addons whose previous or new directories overlap are skipped
//! 3. Plan + commit: one task per remaining addon, followed by a full barrier
//!
//! Ordering is only guaranteed within one addon's change sequence. Failures
//! are isolated: an addon that fails to fetch, plan or commit never stops the
//! others, and every task reports back a typed result that ends up in the
//! [`UpgradeReport`].

mod conflict;
mod types;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::addon::AddonSpec;
use crate::change::{Change, CommitError};
use crate::config::Installation;
use crate::fetch::{FetchedPackage, fetch_addon};
use crate::index::PackageIndex;
use crate::plan::plan_changes;

use conflict::{Claim, find_conflicts};

pub use conflict::Conflict;
pub use types::{AddonError, AddonReport, AddonStatus, UpgradeOptions, UpgradeReport};

/// Upgrade every addon of `installation`.
///
/// Addons that reached the commit phase have their owned directories replaced
/// by the directories of the package just installed. Addons that failed
/// earlier, and every addon in dry-run mode, keep their previous ownership.
pub async fn upgrade<I>(installation: &mut Installation, index: Arc<I>, options: &UpgradeOptions) -> UpgradeReport
where
  I: PackageIndex + 'static,
{
  let base = installation.dir.clone();
  let count = installation.addons.len();

  info!(
    dir = %base.display(),
    addons = count,
    dry_run = options.dry_run,
    "starting upgrade"
  );

  let semaphore = Arc::new(Semaphore::new(options.parallelism.max(1)));

  // Phase 1: fetch everything before touching the disk.
  let fetched = fetch_all(&installation.addons, index, semaphore.clone()).await;
  let mut outcomes: Vec<Option<AddonStatus>> = (0..count).map(|_| None).collect();
  let mut packages: Vec<Option<FetchedPackage>> = (0..count).map(|_| None).collect();

  for (i, result) in fetched.into_iter().enumerate() {
    match result {
      Ok(package) => packages[i] = Some(package),
      Err(e) => outcomes[i] = Some(AddonStatus::Failed(e)),
    }
  }

  // Validate disjoint ownership across the snapshot of all fetched packages.
  // An addon touches both what it owned before and what it ships now.
  let touched: Vec<(usize, BTreeSet<String>)> = packages
    .iter()
    .enumerate()
    .filter_map(|(i, package)| {
      package.as_ref().map(|package| {
        let previous = &installation.addons[i].owned_dirs;
        (i, previous.union(package.owned_dirs()).cloned().collect())
      })
    })
    .collect();
  let claims: Vec<Claim<'_>> = touched
    .iter()
    .map(|(i, dirs)| Claim {
      index: *i,
      name: &installation.addons[*i].name,
      dirs,
    })
    .collect();
  let conflicts = find_conflicts(&claims);
  drop(claims);

  for (i, conflict) in conflicts {
    packages[i] = None;
    outcomes[i] = Some(AddonStatus::Failed(AddonError::Conflict {
      dirs: conflict.dirs,
      with: conflict.with,
    }));
  }

  // Phase 2: plan and commit each remaining addon independently.
  let mut new_owned: Vec<Option<BTreeSet<String>>> = (0..count).map(|_| None).collect();
  let mut work = Vec::new();
  for (i, package) in packages.into_iter().enumerate() {
    if let Some(package) = package {
      new_owned[i] = Some(package.owned_dirs().clone());
      work.push((i, installation.addons[i].clone(), package));
    }
  }

  let committed = commit_all(work, &base, options.dry_run, semaphore).await;
  for (i, status) in committed {
    if matches!(status, AddonStatus::Applied { .. })
      && let Some(dirs) = new_owned[i].take()
    {
      installation.addons[i].owned_dirs = dirs;
    }
    outcomes[i] = Some(status);
  }

  let addons = installation
    .addons
    .iter()
    .zip(outcomes)
    .map(|(spec, status)| AddonReport {
      name: spec.name.clone(),
      status: status.unwrap_or_else(|| AddonStatus::Failed(AddonError::Task("commit task did not complete".to_string()))),
    })
    .collect();
  let report = UpgradeReport { addons };

  log_report(&report);
  report
}

/// Fetch every addon concurrently, returning results in addon order.
async fn fetch_all<I>(
  addons: &[AddonSpec],
  index: Arc<I>,
  semaphore: Arc<Semaphore>,
) -> Vec<Result<FetchedPackage, AddonError>>
where
  I: PackageIndex + 'static,
{
  let mut join_set = JoinSet::new();

  for (i, spec) in addons.iter().enumerate() {
    let spec = spec.clone();
    let index = index.clone();
    let semaphore = semaphore.clone();

    join_set.spawn(async move {
      let _permit = semaphore.acquire().await;
      debug!(addon = %spec.name, kind = %spec.kind, "fetching");
      (i, fetch_addon(&spec, index.as_ref()).await)
    });
  }

  let mut results: Vec<Option<Result<FetchedPackage, AddonError>>> = (0..addons.len()).map(|_| None).collect();

  while let Some(join_result) = join_set.join_next().await {
    match join_result {
      Ok((i, result)) => {
        if let Err(e) = &result {
          error!(addon = %addons[i].name, error = %e, "fetch failed");
        }
        results[i] = Some(result.map_err(AddonError::from));
      }
      Err(e) => {
        error!(error = %e, "fetch task panicked");
      }
    }
  }

  results
    .into_iter()
    .map(|r| r.unwrap_or_else(|| Err(AddonError::Task("fetch task did not complete".to_string()))))
    .collect()
}

/// Plan and commit each addon on the blocking pool.
///
/// Addons whose task panicked are missing from the result.
async fn commit_all(
  work: Vec<(usize, AddonSpec, FetchedPackage)>,
  base: &Path,
  dry_run: bool,
  semaphore: Arc<Semaphore>,
) -> Vec<(usize, AddonStatus)> {
  let mut join_set = JoinSet::new();

  for (i, spec, package) in work {
    let base = base.to_path_buf();
    let permit = semaphore.clone().acquire_owned().await;

    join_set.spawn_blocking(move || {
      let _permit = permit;
      (i, plan_and_commit(&spec, &package, &base, dry_run))
    });
  }

  let mut results = Vec::new();
  while let Some(join_result) = join_set.join_next().await {
    match join_result {
      Ok(result) => results.push(result),
      Err(e) => {
        error!(error = %e, "commit task panicked");
      }
    }
  }

  results
}

/// Compute an addon's plan and commit it change by change.
///
/// The plan's "old" side is the ownership recorded on `spec` before this run.
/// A failed change does not stop the ones after it.
fn plan_and_commit(spec: &AddonSpec, package: &FetchedPackage, base: &Path, dry_run: bool) -> AddonStatus {
  let changes = match plan_changes(spec, &spec.owned_dirs, package, base) {
    Ok(changes) => changes,
    Err(e) => return AddonStatus::Failed(AddonError::Plan(e)),
  };

  if dry_run {
    return AddonStatus::Planned { changes };
  }

  let (committed, failures) = commit_changes(&changes);
  AddonStatus::Applied { committed, failures }
}

fn commit_changes(changes: &[Change]) -> (usize, Vec<CommitError>) {
  let mut committed = 0;
  let mut failures = Vec::new();

  for change in changes {
    match change.commit() {
      Ok(()) => committed += 1,
      Err(e) => failures.push(e),
    }
  }

  (committed, failures)
}

fn log_report(report: &UpgradeReport) {
  for addon in &report.addons {
    match &addon.status {
      AddonStatus::Applied { committed, failures } if failures.is_empty() => {
        info!(addon = %addon.name, changes = committed, "upgraded");
      }
      AddonStatus::Applied { committed, failures } => {
        for failure in failures {
          warn!(addon = %addon.name, error = %failure, "change failed");
        }
        error!(
          addon = %addon.name,
          committed,
          failed = failures.len(),
          "upgrade partially applied"
        );
      }
      AddonStatus::Planned { changes } => {
        info!(addon = %addon.name, changes = changes.len(), "planned");
      }
      AddonStatus::Failed(AddonError::Fetch(_)) => {
        // Already reported when the fetch phase finished.
      }
      AddonStatus::Failed(e) => {
        error!(addon = %addon.name, error = %e, "skipped");
      }
    }
  }

  info!(
    addons = report.addons.len(),
    failed = report.failed_count(),
    committed = report.committed_count(),
    "upgrade complete"
  );
}
