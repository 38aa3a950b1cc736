use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::state::sanitize_session_id;

/// A lock younger than this is held by another Stop invocation.
pub const LOCK_TTL_SECS: f64 = 2.0;

pub fn lock_path(state_dir: &Path, session_id: &str) -> PathBuf {
    state_dir.join(format!(
        "claudia_stop_lock_{}.tmp",
        sanitize_session_id(session_id)
    ))
}

/// Claim this turn's output slot for `session_id`.
pub fn try_acquire(state_dir: &Path, session_id: &str) -> bool {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    try_acquire_at(state_dir, session_id, now)
}

/// Optimistic read-compare-write on the lock file.
/// A fresh timestamp means someone else already spoke this turn. Any read,
/// parse or write failure counts as acquired.
pub fn try_acquire_at(state_dir: &Path, session_id: &str, now: f64) -> bool {
    let path = lock_path(state_dir, session_id);
    if path.exists() {
        let held_since = match fs::read_to_string(&path)
            .map_err(|_| ())
            .and_then(|raw| raw.trim().parse::<f64>().map_err(|_| ()))
        {
            Ok(ts) => ts,
            Err(()) => return true,
        };
        if now - held_since < LOCK_TTL_SECS {
            return false;
        }
    }
    let _ = fs::create_dir_all(state_dir);
    let _ = fs::write(&path, now.to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_acquire_wins_second_loses() {
        let dir = TempDir::new().unwrap();
        assert!(try_acquire_at(dir.path(), "s1", 100.0));
        assert!(!try_acquire_at(dir.path(), "s1", 101.0));
    }

    #[test]
    fn test_lock_expires_after_ttl() {
        let dir = TempDir::new().unwrap();
        assert!(try_acquire_at(dir.path(), "s1", 100.0));
        assert!(try_acquire_at(dir.path(), "s1", 102.5));
    }

    #[test]
    fn test_sessions_do_not_share_locks() {
        let dir = TempDir::new().unwrap();
        assert!(try_acquire_at(dir.path(), "s1", 100.0));
        assert!(try_acquire_at(dir.path(), "s2", 100.5));
    }

    #[test]
    fn test_garbage_lock_counts_as_acquired() {
        let dir = TempDir::new().unwrap();
        fs::write(lock_path(dir.path(), "s1"), "not-a-float").unwrap();
        assert!(try_acquire_at(dir.path(), "s1", 100.0));
    }

    #[test]
    fn test_lock_file_holds_timestamp() {
        let dir = TempDir::new().unwrap();
        try_acquire_at(dir.path(), "s1", 123.5);
        let raw = fs::read_to_string(lock_path(dir.path(), "s1")).unwrap();
        assert_eq!(raw.trim().parse::<f64>().unwrap(), 123.5);
    }
}
