//! Shared helpers for pipeline tests.

use std::collections::BTreeMap;
use std::path::Path;

use mockito::ServerGuard;
use walkdir::WalkDir;
use wpm_lib::addon::Remote;
use wpm_lib::index::HttpIndex;

#[path = "../../src/testutil.rs"]
mod testutil;

pub use testutil::zip_bytes;

/// A project listing page whose newest file downloads from `href`.
pub fn listing_page(href: &str) -> String {
  format!(
    r#"<table class="listing project-file-listing"><tbody>
<tr class="project-file-list-item">
  <td><div class="project-file-download-button">
    <a class="button tip fa-icon-download icon-only" href="{href}"></a>
  </div></td>
</tr>
</tbody></table>"#
  )
}

/// Serve `archive` as the newest file of project `name`.
pub async fn serve_project(server: &mut ServerGuard, name: &str, archive: Vec<u8>) {
  let href = format!("/projects/{name}/files/1/download");
  server
    .mock("GET", format!("/projects/{name}/files").as_str())
    .with_status(200)
    .with_body(listing_page(&href))
    .create_async()
    .await;
  server
    .mock("GET", href.as_str())
    .with_status(200)
    .with_body(archive)
    .create_async()
    .await;
}

/// An index that sends both remotes to `server`.
pub fn index_for(server: &ServerGuard) -> HttpIndex {
  HttpIndex::new()
    .with_host(Remote::Curse, server.url().parse().unwrap())
    .with_host(Remote::WowAce, server.url().parse().unwrap())
}

/// Every file and directory under `root`, relative, with file contents.
pub fn snapshot_tree(root: &Path) -> BTreeMap<String, Option<String>> {
  WalkDir::new(root)
    .min_depth(1)
    .into_iter()
    .map(|entry| entry.unwrap())
    .map(|entry| {
      let relative = entry
        .path()
        .strip_prefix(root)
        .unwrap()
        .to_string_lossy()
        .replace('\\', "/");
      let content = entry
        .file_type()
        .is_file()
        .then(|| std::fs::read_to_string(entry.path()).unwrap());
      (relative, content)
    })
    .collect()
}
