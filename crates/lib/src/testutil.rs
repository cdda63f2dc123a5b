//! Test utilities for wpm-lib.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

/// Build an in-memory zip archive.
///
/// Each entry is `(name, content)`; a `None` content adds a directory entry.
pub fn zip_bytes(entries: &[(&str, Option<&str>)]) -> Vec<u8> {
  let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
  let options = SimpleFileOptions::default();

  for (name, content) in entries {
    match content {
      Some(content) => {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
      }
      None => {
        writer.add_directory(*name, options).unwrap();
      }
    }
  }

  writer.finish().unwrap().into_inner()
}
