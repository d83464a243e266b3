//! Atomic JSON persistence.
//!
//! Writers never observe a partial file: content is written to a temp file
//! in the same directory as the destination, fsynced, then renamed into
//! place. Same-filesystem rename is what makes the swap atomic, which is why
//! the temp file is never created under the system temp directory.

use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::error::PlashboardError;

/// Serialize `value` as 2-space-indented JSON with a trailing newline and
/// write it to `path` atomically.
pub fn atomic_write_json<T: Serialize>(path: &Utf8Path, value: &T) -> Result<(), PlashboardError> {
    let mut body =
        serde_json::to_string_pretty(value).map_err(|e| PlashboardError::Io {
            path: path.to_string(),
            reason: format!("failed to serialize JSON: {e}"),
        })?;
    body = normalize_line_endings(&body);
    body.push('\n');
    atomic_write_bytes(path, body.as_bytes())
}

/// Write raw bytes atomically: ensure the parent directory exists, write a
/// sibling temp file, fsync, then rename over `path`.
pub fn atomic_write_bytes(path: &Utf8Path, content: &[u8]) -> Result<(), PlashboardError> {
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    ensure_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| PlashboardError::Io {
        path: path.to_string(),
        reason: format!("failed to create temp file in {parent}: {e}"),
    })?;

    temp.write_all(content).map_err(|e| PlashboardError::Io {
        path: path.to_string(),
        reason: format!("failed to write temp file: {e}"),
    })?;
    temp.as_file().sync_all().map_err(|e| PlashboardError::Io {
        path: path.to_string(),
        reason: format!("failed to fsync temp file: {e}"),
    })?;

    temp.persist(path.as_std_path())
        .map_err(|e| PlashboardError::Io {
            path: path.to_string(),
            reason: format!("failed to rename into place: {e}"),
        })?;

    Ok(())
}

/// Read and parse a JSON file, returning `Ok(None)` when it doesn't exist.
pub fn read_json_opt<T: serde::de::DeserializeOwned>(
    path: &Utf8Path,
) -> Result<Option<T>, PlashboardError> {
    match fs::read_to_string(path.as_std_path()) {
        Ok(text) => {
            let value = serde_json::from_str(&text).map_err(|e| PlashboardError::Io {
                path: path.to_string(),
                reason: format!("failed to parse JSON: {e}"),
            })?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PlashboardError::Io {
            path: path.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// `fs::create_dir_all`, mapped to our error type.
pub fn ensure_dir_all(path: &Utf8Path) -> Result<(), PlashboardError> {
    fs::create_dir_all(path.as_std_path()).map_err(|e| PlashboardError::Io {
        path: path.to_string(),
        reason: format!("failed to create directory: {e}"),
    })
}

/// Remove a file, treating a missing file as success.
pub fn remove_file_if_exists(path: &Utf8Path) -> Result<(), PlashboardError> {
    match fs::remove_file(path.as_std_path()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PlashboardError::Io {
            path: path.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// List entries of a directory sorted by filename, returning an empty list
/// when the directory doesn't exist.
pub fn sorted_dir_entries(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, PlashboardError> {
    let read_dir = match fs::read_dir(dir.as_std_path()) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(PlashboardError::Io {
                path: dir.to_string(),
                reason: e.to_string(),
            });
        }
    };

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| PlashboardError::Io {
            path: dir.to_string(),
            reason: e.to_string(),
        })?;
        let path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|p| PlashboardError::Io {
                path: p.to_string_lossy().to_string(),
                reason: "path is not valid UTF-8".to_string(),
            })?;
        entries.push(path);
    }
    entries.sort();
    Ok(entries)
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}
