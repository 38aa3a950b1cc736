//! Per-checker, per-session JSON state under the state root.
//!
//! Files are named `claudia_<checker>_state_<session>.json`. Loads never fail:
//! a missing or corrupt file reads as the caller's default. Saves are
//! best-effort and swallow I/O errors.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::commands::atomic_io;

/// Set of dedup keys already surfaced in a session.
pub type ShownSet = BTreeSet<String>;

#[derive(Debug, Clone, Copy)]
pub struct SessionStore<'a> {
    state_dir: &'a Path,
    checker: &'static str,
}

impl<'a> SessionStore<'a> {
    pub fn new(state_dir: &'a Path, checker: &'static str) -> Self {
        Self { state_dir, checker }
    }

    pub fn path(&self, session_id: &str) -> PathBuf {
        self.state_dir.join(format!(
            "claudia_{}_state_{}.json",
            self.checker,
            sanitize_session_id(session_id)
        ))
    }

    pub fn load<T: DeserializeOwned + Default>(&self, session_id: &str) -> T {
        atomic_io::read_json_or_default(&self.path(session_id))
    }

    pub fn save<T: Serialize + ?Sized>(&self, session_id: &str, value: &T) {
        let _ = atomic_io::write_json(&self.path(session_id), value);
    }
}

/// Keep session ids from escaping the state root.
pub fn sanitize_session_id(session_id: &str) -> String {
    let cleaned = session_id.replace(['/', '\\'], "_").replace("..", "_");
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Counter {
        #[serde(default)]
        count: u32,
        #[serde(default)]
        shown_tip: bool,
    }

    #[test]
    fn test_path_uses_checker_and_session() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path(), "css");
        assert_eq!(
            store.path("s1"),
            dir.path().join("claudia_css_state_s1.json")
        );
    }

    #[test]
    fn test_missing_state_is_default() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path(), "coach");
        let c: Counter = store.load("s1");
        assert_eq!(c, Counter::default());
        let shown: ShownSet = store.load("s1");
        assert!(shown.is_empty());
    }

    #[test]
    fn test_corrupt_state_is_default() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path(), "coach");
        fs::write(store.path("s1"), "\u{0}garbage").unwrap();
        let c: Counter = store.load("s1");
        assert_eq!(c, Counter::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path(), "coach");
        store.save("s1", &Counter { count: 2, shown_tip: true });
        let c: Counter = store.load("s1");
        assert_eq!(c, Counter { count: 2, shown_tip: true });

        let other: Counter = store.load("s2");
        assert_eq!(other, Counter::default());
    }

    #[test]
    fn test_save_into_missing_dir_is_created() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("not-yet");
        let store = SessionStore::new(&root, "a11y");
        let mut shown = ShownSet::new();
        shown.insert("k".to_string());
        store.save("s1", &shown);
        assert!(store.path("s1").exists());
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        // state root is a regular file: every write fails
        let store = SessionStore::new(&blocker, "a11y");
        store.save("s1", &ShownSet::new());
        let shown: ShownSet = store.load("s1");
        assert!(shown.is_empty());
    }

    #[test]
    fn test_sanitize_session_id() {
        assert_eq!(sanitize_session_id("abc-123"), "abc-123");
        assert_eq!(sanitize_session_id("../../etc"), "____etc");
        assert_eq!(sanitize_session_id(""), "default");
    }
}
