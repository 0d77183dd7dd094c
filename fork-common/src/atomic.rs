//! Atomic file writes (temp file + rename)
//!
//! Every cache the enrichment jobs checkpoint goes through here, so a crash
//! mid-write leaves either the old file or the new one, never a torn one.

use crate::Result;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Path of the sibling temp file used while writing `target`
pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

/// Write raw bytes to `target` atomically
///
/// Creates the parent directory when missing.
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path_for(target);
    fs::write(&tmp, contents)?;
    if let Err(e) = fs::rename(&tmp, target) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Serialize `value` as pretty JSON (2-space indent) and write it atomically
pub fn write_json_atomic<T: Serialize + ?Sized>(target: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    write_atomic(target, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path_for(Path::new("/data/enrichment.json"));
        assert_eq!(tmp, PathBuf::from("/data/enrichment.json.tmp"));
    }

    #[test]
    fn test_write_json_atomic_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("cache.json");

        let mut value = BTreeMap::new();
        value.insert("Ja Rule", "US");
        write_json_atomic(&target, &value).unwrap();

        assert!(target.exists());
        assert!(!dir.path().join("cache.json.tmp").exists());

        let read: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(read.get("Ja Rule").map(String::as_str), Some("US"));
    }

    #[test]
    fn test_write_atomic_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("albums.json");

        write_atomic(&target, b"[]").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "[]");
    }

    #[test]
    fn test_write_atomic_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("albums.json");

        write_atomic(&target, b"[1]").unwrap();
        write_atomic(&target, b"[2]").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "[2]");
    }
}
