//! Ownership conflict detection.
//!
//! Addons write into the shared installation directory without locking, so
//! their owned directory sets must be disjoint. Runs between the fetch and
//! commit phases over every addon's newly fetched ownership.

use std::collections::{BTreeMap, BTreeSet};

/// Directories an addon shares with other addons.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Conflict {
  pub dirs: BTreeSet<String>,
  pub with: BTreeSet<String>,
}

/// A claim on a set of directories by the addon at `index`.
pub struct Claim<'a> {
  pub index: usize,
  pub name: &'a str,
  pub dirs: &'a BTreeSet<String>,
}

/// Find every claim overlapping another, keyed by claim index.
pub fn find_conflicts(claims: &[Claim<'_>]) -> BTreeMap<usize, Conflict> {
  let mut claimants: BTreeMap<&str, Vec<&Claim<'_>>> = BTreeMap::new();
  for claim in claims {
    for dir in claim.dirs {
      claimants.entry(dir.as_str()).or_default().push(claim);
    }
  }

  let mut conflicts: BTreeMap<usize, Conflict> = BTreeMap::new();
  for (dir, owners) in claimants.into_iter().filter(|(_, owners)| owners.len() > 1) {
    for owner in &owners {
      let conflict = conflicts.entry(owner.index).or_default();
      conflict.dirs.insert(dir.to_string());
      conflict.with.extend(
        owners
          .iter()
          .filter(|other| other.index != owner.index)
          .map(|other| other.name.to_string()),
      );
    }
  }

  conflicts
}
