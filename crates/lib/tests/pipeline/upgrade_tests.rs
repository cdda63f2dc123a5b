//! Upgrades against a mocked project site.

use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use wpm_lib::addon::{AddonSpec, SourceKind};
use wpm_lib::config::Installation;
use wpm_lib::fetch::FetchError;
use wpm_lib::index::IndexError;
use wpm_lib::upgrade::{AddonError, AddonStatus, UpgradeOptions, upgrade};

use super::common::{index_for, serve_project, snapshot_tree, zip_bytes};

fn dirs(names: &[&str]) -> BTreeSet<String> {
  names.iter().map(|d| d.to_string()).collect()
}

#[tokio::test]
async fn upgrade_installs_from_remote() {
  let mut server = mockito::Server::new_async().await;
  serve_project(
    &mut server,
    "deadly-boss-mods",
    zip_bytes(&[
      ("DBM-Core/", None),
      ("DBM-Core/DBM-Core.toc", Some("## Title: DBM")),
      ("DBM-Core/sounds/alarm.ogg", Some("ogg")),
      ("DBM-GUI/DBM-GUI.toc", Some("## Title: DBM GUI")),
    ]),
  )
  .await;

  let temp = TempDir::new().unwrap();
  let mut installation = Installation::new(temp.path());
  installation.addons.push(AddonSpec::new("deadly-boss-mods", SourceKind::Curse));

  let report = upgrade(&mut installation, Arc::new(index_for(&server)), &UpgradeOptions::default()).await;

  assert!(report.is_success(), "{:?}", report);
  assert_eq!(installation.addons[0].owned_dirs, dirs(&["DBM-Core", "DBM-GUI"]));
  assert_eq!(
    fs::read_to_string(temp.path().join("DBM-Core/sounds/alarm.ogg")).unwrap(),
    "ogg"
  );
  assert!(temp.path().join("DBM-GUI/DBM-GUI.toc").is_file());
}

#[tokio::test]
async fn upgrade_is_idempotent() {
  let mut server = mockito::Server::new_async().await;
  serve_project(
    &mut server,
    "bagnon",
    zip_bytes(&[("Bagnon/Bagnon.toc", Some("toc")), ("Bagnon_Config/c.lua", Some("c"))]),
  )
  .await;

  let temp = TempDir::new().unwrap();
  let index = Arc::new(index_for(&server));
  let mut installation = Installation::new(temp.path());
  installation.addons.push(AddonSpec::new("bagnon", SourceKind::WowAce));

  assert!(upgrade(&mut installation, index.clone(), &UpgradeOptions::default()).await.is_success());
  let first = snapshot_tree(temp.path());
  let owned = installation.addons[0].owned_dirs.clone();

  assert!(upgrade(&mut installation, index, &UpgradeOptions::default()).await.is_success());

  assert_eq!(snapshot_tree(temp.path()), first);
  assert_eq!(installation.addons[0].owned_dirs, owned);
}

#[tokio::test]
async fn upgrade_replaces_previous_version() {
  let temp = TempDir::new().unwrap();
  fs::create_dir_all(temp.path().join("Foo/old")).unwrap();
  fs::write(temp.path().join("Foo/old/removed.lua"), "old").unwrap();
  fs::create_dir_all(temp.path().join("Foo_Retired")).unwrap();
  fs::create_dir_all(temp.path().join("Unmanaged")).unwrap();

  let mut server = mockito::Server::new_async().await;
  serve_project(&mut server, "foo", zip_bytes(&[("Foo/Foo.toc", Some("v2"))])).await;

  let mut installation = Installation::new(temp.path());
  installation
    .addons
    .push(AddonSpec::new("foo", SourceKind::Curse).with_owned_dirs(["Foo", "Foo_Retired"]));

  let report = upgrade(&mut installation, Arc::new(index_for(&server)), &UpgradeOptions::default()).await;

  assert!(report.is_success());
  assert!(!temp.path().join("Foo/old").exists());
  assert!(!temp.path().join("Foo_Retired").exists());
  assert!(temp.path().join("Unmanaged").is_dir());
  assert_eq!(fs::read_to_string(temp.path().join("Foo/Foo.toc")).unwrap(), "v2");
  assert_eq!(installation.addons[0].owned_dirs, dirs(&["Foo"]));
}

#[tokio::test]
async fn missing_project_does_not_block_others() {
  let mut server = mockito::Server::new_async().await;
  server
    .mock("GET", "/projects/missing/files")
    .with_status(404)
    .create_async()
    .await;
  serve_project(&mut server, "present", zip_bytes(&[("Present/p.lua", Some("p"))])).await;

  let temp = TempDir::new().unwrap();
  let mut installation = Installation::new(temp.path());
  installation.addons.push(AddonSpec::new("missing", SourceKind::Curse));
  installation.addons.push(AddonSpec::new("present", SourceKind::Curse));

  let report = upgrade(&mut installation, Arc::new(index_for(&server)), &UpgradeOptions::default()).await;

  assert!(matches!(
    report.get("missing"),
    Some(AddonStatus::Failed(AddonError::Fetch(FetchError::Index(IndexError::NotFound { .. }))))
  ));
  assert!(report.get("present").unwrap().is_success());
  assert!(temp.path().join("Present/p.lua").exists());
  assert!(installation.addons[0].owned_dirs.is_empty());
}

#[tokio::test]
async fn ignored_addons_are_left_alone() {
  let temp = TempDir::new().unwrap();
  fs::create_dir_all(temp.path().join("Blizzard_Raid")).unwrap();
  fs::write(temp.path().join("Blizzard_Raid/raid.lua"), "raid").unwrap();

  let server = mockito::Server::new_async().await;
  let mut installation = Installation::new(temp.path());
  installation
    .addons
    .push(AddonSpec::new("Blizzard_Raid", SourceKind::Ignore));

  let report = upgrade(&mut installation, Arc::new(index_for(&server)), &UpgradeOptions::default()).await;

  assert!(report.is_success());
  assert_eq!(report.committed_count(), 0);
  assert!(temp.path().join("Blizzard_Raid/raid.lua").exists());
  assert_eq!(installation.addons[0].owned_dirs, dirs(&["Blizzard_Raid"]));
}

#[cfg(unix)]
#[tokio::test]
async fn link_addon_points_at_location() {
  let source = TempDir::new().unwrap();
  fs::write(source.path().join("Dev.toc"), "dev").unwrap();

  let temp = TempDir::new().unwrap();
  let server = mockito::Server::new_async().await;
  let mut installation = Installation::new(temp.path());
  installation
    .addons
    .push(AddonSpec::new("Dev", SourceKind::Link).with_location(source.path().to_string_lossy()));

  let report = upgrade(&mut installation, Arc::new(index_for(&server)), &UpgradeOptions::default()).await;

  assert!(report.is_success(), "{:?}", report);
  let link = temp.path().join("Dev");
  assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
  assert_eq!(fs::read_to_string(link.join("Dev.toc")).unwrap(), "dev");
  assert_eq!(installation.addons[0].owned_dirs, dirs(&["Dev"]));
}
