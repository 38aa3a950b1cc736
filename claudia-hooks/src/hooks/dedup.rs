use super::patterns::Finding;
use super::state::{SessionStore, ShownSet};

/// Dedup key for write-triggered checkers.
pub fn file_key(file_path: &str, finding_id: &str) -> String {
    format!("{}-{}", file_path, finding_id)
}

/// Dedup key for Stop-triggered checks.
pub fn session_key(session_id: &str, subject: &str) -> String {
    format!("{}:{}", session_id, subject)
}

/// Drop findings already shown for `file_path` in this session and record
/// the rest. The store is only written when something new survives.
pub fn filter_new_findings(
    store: &SessionStore<'_>,
    session_id: &str,
    file_path: &str,
    findings: Vec<Finding>,
) -> Vec<Finding> {
    if findings.is_empty() {
        return findings;
    }
    let mut shown: ShownSet = store.load(session_id);
    let fresh: Vec<Finding> = findings
        .into_iter()
        .filter(|f| shown.insert(file_key(file_path, &f.id)))
        .collect();
    if !fresh.is_empty() {
        store.save(session_id, &shown);
    }
    fresh
}
