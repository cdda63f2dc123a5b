//! Ownership persisted through the configuration file.

use std::collections::BTreeSet;
use std::sync::Arc;

use tempfile::TempDir;
use wpm_lib::addon::{AddonSpec, SourceKind};
use wpm_lib::config::Config;
use wpm_lib::upgrade::{UpgradeOptions, upgrade};

use super::common::{index_for, serve_project, zip_bytes};

#[tokio::test]
async fn ownership_survives_save_and_load() {
  let mut server = mockito::Server::new_async().await;
  serve_project(
    &mut server,
    "foo",
    zip_bytes(&[("Foo/Foo.toc", Some("toc")), ("Foo_Media/m.ogg", Some("m"))]),
  )
  .await;

  let temp = TempDir::new().unwrap();
  let install_dir = temp.path().join("AddOns");
  let config_path = temp.path().join("wpm.yaml");
  std::fs::create_dir_all(&install_dir).unwrap();

  let mut config = Config::init(&config_path, &install_dir, false).unwrap();
  config
    .installation_mut(None)
    .unwrap()
    .add_addon(AddonSpec::new("foo", SourceKind::Curse))
    .unwrap();

  let installation = config.installation_mut(None).unwrap();
  let report = upgrade(installation, Arc::new(index_for(&server)), &UpgradeOptions::default()).await;
  assert!(report.is_success(), "{:?}", report);
  config.save(&config_path).unwrap();

  let yaml = std::fs::read_to_string(&config_path).unwrap();
  assert!(yaml.contains("owns:"));
  assert!(yaml.contains("Foo_Media"));

  let loaded = Config::load(&config_path).unwrap();
  let spec = loaded.installation(None).unwrap().addon("foo").unwrap();
  let expected: BTreeSet<String> = ["Foo", "Foo_Media"].iter().map(|d| d.to_string()).collect();
  assert_eq!(spec.owned_dirs, expected);
}
