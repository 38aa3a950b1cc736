use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Append a suffix to a path, preserving the original extension.
/// `state.json` + `tmp.42` => `state.json.tmp.42`
fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(suffix);
    PathBuf::from(s)
}

/// Write content to a file atomically using temp-file + rename.
/// Writes to `{path}.tmp.{pid}`, then renames to `{path}`.
/// On rename failure, the temp file is removed.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let tmp_path = append_suffix(path, &format!("tmp.{}", std::process::id()));

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }

    fs::write(&tmp_path, content)?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    Ok(())
}

/// Read and decode a JSON document.
/// A missing, unreadable or malformed file yields `T::default()`.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

/// Pretty-print `value` and write it atomically.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    let body = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    atomic_write(path, body.as_bytes())
}
