//! Project-listing scraper for the addon sites.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};
use url::Url;

use super::{IndexError, PackageIndex};
use crate::addon::Remote;

static CURSE_HOST: LazyLock<Url> =
  LazyLock::new(|| Url::parse("https://wow.curseforge.com").expect("curse host is valid"));
static WOWACE_HOST: LazyLock<Url> =
  LazyLock::new(|| Url::parse("https://www.wowace.com").expect("wowace host is valid"));

/// Matches the first (newest) row of a file listing.
static FIRST_ROW: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?s)<tr\b[^>]*project-file-list-item.*?</tr>"#).expect("listing row pattern is valid")
});

/// Matches the download button of a single listing row.
static DOWNLOAD_LINK: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?s)project-file-download-button.*?<a\s[^>]*?href="([^"]+)""#).expect("download link pattern is valid")
});

/// Extract the download href of the newest file from a project listing page.
///
/// Only the first row is considered; older releases are never picked up.
pub fn find_download_href(listing: &str) -> Option<String> {
  let row = FIRST_ROW.find(listing)?;
  DOWNLOAD_LINK
    .captures(row.as_str())
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str().replace("&amp;", "&"))
}

fn default_host(remote: Remote) -> &'static Url {
  match remote {
    Remote::Curse => &*CURSE_HOST,
    Remote::WowAce => &*WOWACE_HOST,
  }
}

/// [`PackageIndex`] backed by the project file listings of each remote.
#[derive(Debug, Clone)]
pub struct HttpIndex {
  client: reqwest::Client,
  hosts: HashMap<Remote, Url>,
}

impl Default for HttpIndex {
  fn default() -> Self {
    Self::new()
  }
}

impl HttpIndex {
  pub fn new() -> Self {
    let hosts = [Remote::Curse, Remote::WowAce]
      .into_iter()
      .map(|remote| (remote, default_host(remote).clone()))
      .collect();
    Self {
      client: reqwest::Client::new(),
      hosts,
    }
  }

  /// Point a remote at a different host, e.g. a mirror or a test server.
  pub fn with_host(mut self, remote: Remote, host: Url) -> Self {
    self.hosts.insert(remote, host);
    self
  }

  fn host(&self, remote: Remote) -> &Url {
    self.hosts.get(&remote).unwrap_or_else(|| default_host(remote))
  }

  /// URL of the file listing for `name` on `remote`.
  ///
  /// `name` is a single path segment and is percent-encoded as such.
  pub fn listing_url(&self, name: &str, remote: Remote) -> Result<Url, IndexError> {
    let host = self.host(remote);
    let mut url = host.clone();
    url
      .path_segments_mut()
      .map_err(|()| IndexError::InvalidHost { host: host.to_string() })?
      .pop_if_empty()
      .extend(["projects", name, "files"]);
    Ok(url)
  }

  /// GET `url`, mapping 404 to `None`.
  async fn get(&self, url: &Url) -> Result<Option<Vec<u8>>, IndexError> {
    let response = self
      .client
      .get(url.clone())
      .send()
      .await
      .map_err(|source| IndexError::Http {
        url: url.to_string(),
        source,
      })?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !status.is_success() {
      return Err(IndexError::Status {
        url: url.to_string(),
        status: status.as_u16(),
      });
    }

    let bytes = response.bytes().await.map_err(|source| IndexError::Http {
      url: url.to_string(),
      source,
    })?;
    Ok(Some(bytes.to_vec()))
  }
}

/// Resolve a listing href the way a browser would, relative to the listing page.
fn resolve_href(listing_url: &Url, href: &str) -> Result<Url, IndexError> {
  listing_url.join(href).map_err(|source| IndexError::InvalidHref {
    href: href.to_string(),
    source,
  })
}

impl PackageIndex for HttpIndex {
  async fn latest_archive(&self, name: &str, remote: Remote) -> Result<Vec<u8>, IndexError> {
    let not_found = || IndexError::NotFound {
      name: name.to_string(),
      remote,
    };

    let listing_url = self.listing_url(name, remote)?;
    debug!(addon = name, url = %listing_url, "fetching file listing");

    let listing = self.get(&listing_url).await?.ok_or_else(not_found)?;
    let listing = String::from_utf8_lossy(&listing);
    let href = find_download_href(&listing).ok_or_else(not_found)?;

    let archive_url = resolve_href(&listing_url, &href)?;
    info!(addon = name, url = %archive_url, "downloading archive");

    let bytes = self.get(&archive_url).await?.ok_or_else(not_found)?;
    debug!(addon = name, size = bytes.len(), "download complete");
    Ok(bytes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn listing(hrefs: &[&str]) -> String {
    let rows: String = hrefs
      .iter()
      .map(|href| {
        format!(
          r#"<tr class="project-file-list-item">
  <td class="project-file-release-type"><div class="release-phase tip"></div></td>
  <td><div class="project-file-download-button">
    <a class="button tip fa-icon-download icon-only" href="{href}"></a>
  </div></td>
</tr>"#
        )
      })
      .collect();
    format!(r#"<table class="listing project-file-listing"><tbody>{rows}</tbody></table>"#)
  }

  #[test]
  fn find_download_href_picks_first_row() {
    let html = listing(&["/projects/foo/files/200/download", "/projects/foo/files/100/download"]);
    assert_eq!(
      find_download_href(&html).as_deref(),
      Some("/projects/foo/files/200/download")
    );
  }

  #[test]
  fn find_download_href_none_without_rows() {
    assert_eq!(find_download_href("<html><body>No files</body></html>"), None);
  }

  #[test]
  fn find_download_href_unescapes_entities() {
    let html = listing(&["/download?file=1&amp;v=2"]);
    assert_eq!(find_download_href(&html).as_deref(), Some("/download?file=1&v=2"));
  }

  #[test]
  fn find_download_href_ignores_older_rows() {
    let html = format!(
      r#"<table><tbody>
<tr class="project-file-list-item"><td>processing, no download yet</td></tr>
{}
</tbody></table>"#,
      listing(&["/projects/foo/files/1/download"])
    );
    assert_eq!(find_download_href(&html), None);
  }

  #[test]
  fn listing_url_uses_remote_host() {
    let index = HttpIndex::new();
    assert_eq!(
      index.listing_url("deadly-boss-mods", Remote::Curse).unwrap().as_str(),
      "https://wow.curseforge.com/projects/deadly-boss-mods/files"
    );
    assert_eq!(
      index.listing_url("ace3", Remote::WowAce).unwrap().as_str(),
      "https://www.wowace.com/projects/ace3/files"
    );
  }

  #[test]
  fn listing_url_encodes_name_as_one_segment() {
    let index = HttpIndex::new();
    assert_eq!(
      index.listing_url("a/b?c#d", Remote::Curse).unwrap().as_str(),
      "https://wow.curseforge.com/projects/a%2Fb%3Fc%23d/files"
    );
  }

  #[test]
  fn listing_url_keeps_host_path_prefix() {
    let host = Url::parse("http://127.0.0.1:9000/mirror/").unwrap();
    let index = HttpIndex::new().with_host(Remote::WowAce, host);
    assert_eq!(
      index.listing_url("ace3", Remote::WowAce).unwrap().as_str(),
      "http://127.0.0.1:9000/mirror/projects/ace3/files"
    );
  }

  #[test]
  fn listing_url_rejects_hosts_without_path() {
    let host = Url::parse("mailto:someone@example.com").unwrap();
    let index = HttpIndex::new().with_host(Remote::Curse, host);
    assert!(matches!(
      index.listing_url("foo", Remote::Curse),
      Err(IndexError::InvalidHost { .. })
    ));
  }

  #[test]
  fn resolve_href_is_relative_to_listing_page() {
    let listing_url = Url::parse("http://127.0.0.1:9000/projects/foo/files").unwrap();
    assert_eq!(
      resolve_href(&listing_url, "/files/1/download").unwrap().as_str(),
      "http://127.0.0.1:9000/files/1/download"
    );
    assert_eq!(
      resolve_href(&listing_url, "files/1/download").unwrap().as_str(),
      "http://127.0.0.1:9000/projects/foo/files/1/download"
    );
    assert_eq!(
      resolve_href(&listing_url, "https://cdn.example.com/a.zip").unwrap().as_str(),
      "https://cdn.example.com/a.zip"
    );
  }

  #[tokio::test]
  async fn latest_archive_downloads_first_listed_file() {
    let mut server = mockito::Server::new_async().await;
    let listing_mock = server
      .mock("GET", "/projects/foo/files")
      .with_status(200)
      .with_body(listing(&["/projects/foo/files/2/download", "/projects/foo/files/1/download"]))
      .create_async()
      .await;
    let download_mock = server
      .mock("GET", "/projects/foo/files/2/download")
      .with_status(200)
      .with_body("zip-bytes")
      .create_async()
      .await;

    let index = HttpIndex::new().with_host(Remote::Curse, server.url().parse().unwrap());
    let bytes = index.latest_archive("foo", Remote::Curse).await.unwrap();

    assert_eq!(bytes, b"zip-bytes");
    listing_mock.assert_async().await;
    download_mock.assert_async().await;
  }

  #[tokio::test]
  async fn latest_archive_follows_relative_href() {
    let mut server = mockito::Server::new_async().await;
    let _listing = server
      .mock("GET", "/projects/foo/files")
      .with_status(200)
      .with_body(listing(&["files/7/download"]))
      .create_async()
      .await;
    let download_mock = server
      .mock("GET", "/projects/foo/files/7/download")
      .with_status(200)
      .with_body("zip-bytes")
      .create_async()
      .await;

    let index = HttpIndex::new().with_host(Remote::Curse, server.url().parse().unwrap());
    let bytes = index.latest_archive("foo", Remote::Curse).await.unwrap();

    assert_eq!(bytes, b"zip-bytes");
    download_mock.assert_async().await;
  }

  #[tokio::test]
  async fn latest_archive_missing_project_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/projects/missing/files")
      .with_status(404)
      .create_async()
      .await;

    let index = HttpIndex::new().with_host(Remote::WowAce, server.url().parse().unwrap());
    let err = index.latest_archive("missing", Remote::WowAce).await.unwrap_err();

    assert!(matches!(err, IndexError::NotFound { .. }));
  }

  #[tokio::test]
  async fn latest_archive_server_error_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/projects/foo/files")
      .with_status(503)
      .create_async()
      .await;

    let index = HttpIndex::new().with_host(Remote::Curse, server.url().parse().unwrap());
    let err = index.latest_archive("foo", Remote::Curse).await.unwrap_err();

    assert!(matches!(err, IndexError::Status { status: 503, .. }));
  }
}
