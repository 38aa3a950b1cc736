use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

/// Name of the hook error log inside the state root.
pub const ERROR_LOG: &str = "claudia-hook-errors.log";

/// ANSI 256-colour code for warnings.
pub const COLOR_WARN: u8 = 160;
/// ANSI 256-colour code for softer notices.
pub const COLOR_NOTICE: u8 = 209;

/// Resolve the Claude config directory.
/// Uses `CLAUDE_CONFIG_DIR` env var if set, otherwise `$HOME/.claude`.
pub fn resolve_claude_dir() -> PathBuf {
    if let Ok(dir) = env::var("CLAUDE_CONFIG_DIR") {
        PathBuf::from(dir)
    } else if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".claude")
    } else {
        PathBuf::from(".claude")
    }
}

/// Log a hook failure to `claudia-hook-errors.log`.
/// Trims to 50 entries (keeps last 30) to prevent unbounded growth.
pub fn log_hook_error(state_dir: &Path, hook_name: &str, exit_code: i32) {
    log_hook_message(state_dir, &format!("{} exit={}", hook_name, exit_code));
}

/// Log a freeform message to the hook error log.
pub fn log_hook_message(state_dir: &Path, message: &str) {
    let log_path = state_dir.join(ERROR_LOG);
    let ts = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let entry = format!("[{}] {}\n", ts, message);

    if fs::create_dir_all(state_dir).is_err() {
        return;
    }
    if let Ok(mut f) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = f.write_all(entry.as_bytes());
    }

    trim_log_file(&log_path, 50, 30);
}

/// Trim a log file: if it exceeds `max_lines`, keep only the last `keep_lines`.
fn trim_log_file(path: &Path, max_lines: usize, keep_lines: usize) {
    if let Ok(content) = fs::read_to_string(path) {
        let lines: Vec<&str> = content.lines().collect();
        if lines.len() > max_lines {
            let mut output = lines[lines.len() - keep_lines..].join("\n");
            output.push('\n');
            let _ = fs::write(path, output);
        }
    }
}

/// Pull the text a write-family tool is about to put on disk.
///
/// `Write` yields `content`, `Edit` yields `new_string`, `MultiEdit` yields
/// every edit's `new_string` joined by a single space. Anything else is empty.
pub fn extract_content(tool_name: &str, tool_input: &Value) -> String {
    let field = |v: &Value, key: &str| v.get(key).and_then(|s| s.as_str()).unwrap_or("").to_string();
    match tool_name {
        "Write" => field(tool_input, "content"),
        "Edit" => field(tool_input, "new_string"),
        "MultiEdit" => tool_input
            .get("edits")
            .and_then(|e| e.as_array())
            .map(|edits| {
                edits
                    .iter()
                    .map(|e| field(e, "new_string"))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// How much of a path counts as test material for [`is_test_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestScope {
    /// Tests, fixtures, samples or docs anywhere in the path. The secret gate.
    Material,
    /// Test sources and fixtures only. Advisory rules relaxed for tests.
    Source,
    /// Inside a test or fixture directory.
    Directory,
    /// A dotenv basename announcing a template rather than live values.
    EnvTemplate,
}

impl TestScope {
    fn markers(self) -> &'static [&'static str] {
        match self {
            TestScope::Material => &["test", "spec", "fixture", "mock", ".example", ".sample", ".md"],
            TestScope::Source => &[".test.", ".spec.", "/test/", "/tests/", "fixture", "mock", "__test__"],
            TestScope::Directory => &["/test/", "/tests/", "/fixtures/", "/mock/"],
            TestScope::EnvTemplate => &["example", "sample", "template", "test"],
        }
    }
}

/// Case-insensitive test/fixture exclusion shared by every checker.
pub fn is_test_path(path: &str, scope: TestScope) -> bool {
    let lower = path.to_lowercase();
    scope.markers().iter().any(|m| lower.contains(m))
}

/// Last path segment, or the whole string when there is none.
pub fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

/// Lowercased extension without the dot.
pub fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Wrap text in a 256-colour ANSI foreground escape.
pub fn colorize(code: u8, text: &str) -> String {
    format!("\x1b[38;5;{}m{}\x1b[0m", code, text)
}

/// Opt-out hints attached to recurring coaching output.
/// Returns `(user_hint, assistant_hint)`.
pub fn dismiss_hint(hook: &str) -> (String, String) {
    let user = format!("(Say \"silence {}\" to turn these off.)", hook);
    let assistant = format!(
        "If the user asks to silence {hook}, add \"{hook}\" to the suppress_hooks list in ~/.claude/claudia.json.",
    );
    (user, assistant)
}

/// Topic variant of [`dismiss_hint`] for teach tips.
pub fn topic_dismiss_hint(topic: &str) -> (String, String) {
    let user = format!("(Say \"silence {}\" to skip tips on this topic.)", topic);
    let assistant = format!(
        "If the user asks to stop tips about {topic}, add \"{topic}\" to the suppress_topics list in ~/.claude/claudia.json.",
    );
    (user, assistant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_extract_content_write_edit_multiedit() {
        assert_eq!(extract_content("Write", &json!({"content": "abc"})), "abc");
        assert_eq!(extract_content("Edit", &json!({"new_string": "x", "old_string": "y"})), "x");
        let multi = json!({"edits": [
            {"old_string": "a", "new_string": "one"},
            {"old_string": "b", "new_string": "two"},
            {"old_string": "c"}
        ]});
        assert_eq!(extract_content("MultiEdit", &multi), "one two ");
        assert_eq!(extract_content("Read", &json!({"content": "abc"})), "");
    }

    #[test]
    fn test_extract_content_missing_fields() {
        assert_eq!(extract_content("Write", &json!({})), "");
        assert_eq!(extract_content("MultiEdit", &json!({"edits": "nope"})), "");
    }

    #[test]
    fn test_material_scope() {
        for path in ["/app/src/config.test.js", "/app/fixtures/keys.json", "/app/.env.example", "/app/README.md"] {
            assert!(is_test_path(path, TestScope::Material), "{}", path);
        }
        assert!(!is_test_path("/app/src/config.js", TestScope::Material));
    }

    #[test]
    fn test_source_scope_is_narrower() {
        assert!(is_test_path("/app/src/button.test.tsx", TestScope::Source));
        assert!(is_test_path("/app/__mocks__/api.js", TestScope::Source));
        assert!(is_test_path("/app/src/Button.Spec.tsx", TestScope::Source));
        assert!(!is_test_path("/app/src/latest.js", TestScope::Source));
        assert!(is_test_path("/app/src/latest.js", TestScope::Material));
    }

    #[test]
    fn test_env_template_and_directory_scopes() {
        assert!(is_test_path(".env.example", TestScope::EnvTemplate));
        assert!(is_test_path(".env.TEMPLATE", TestScope::EnvTemplate));
        assert!(!is_test_path(".env.production", TestScope::EnvTemplate));
        assert!(is_test_path("/app/tests/.env", TestScope::Directory));
        assert!(!is_test_path("/app/src/.env", TestScope::Directory));
    }

    #[test]
    fn test_basename_and_extension() {
        assert_eq!(basename("/a/b/Dockerfile"), "Dockerfile");
        assert_eq!(extension("/a/b/page.HTML"), "html");
        assert_eq!(extension("/a/b/Makefile"), "");
    }

    #[test]
    fn test_colorize_wraps() {
        assert_eq!(colorize(160, "hi"), "\x1b[38;5;160mhi\x1b[0m");
    }

    #[test]
    fn test_dismiss_hint_mentions_hook() {
        let (user, assistant) = dismiss_hint("milestones");
        assert!(user.contains("silence milestones"));
        assert!(assistant.contains("suppress_hooks"));
        assert!(assistant.contains("claudia.json"));

        let (_, topic) = topic_dismiss_hint("docker");
        assert!(topic.contains("suppress_topics"));
    }

    #[test]
    fn test_log_hook_error_creates_file() {
        let dir = TempDir::new().unwrap();
        log_hook_error(dir.path(), "check-css", 1);

        let content = fs::read_to_string(dir.path().join(ERROR_LOG)).unwrap();
        assert!(content.contains("check-css exit=1"));
    }

    #[test]
    fn test_log_hook_error_trims() {
        let dir = TempDir::new().unwrap();
        for i in 0..55 {
            log_hook_error(dir.path(), &format!("hook-{}", i), 1);
        }

        let content = fs::read_to_string(dir.path().join(ERROR_LOG)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines.len() <= 50, "log should never exceed 50 lines, got {}", lines.len());
        assert!(content.contains("hook-54 "));
        assert!(!content.contains("hook-0 "));
    }

    #[test]
    fn test_log_hook_message() {
        let dir = TempDir::new().unwrap();
        log_hook_message(dir.path(), "stdin was not JSON");
        let content = fs::read_to_string(dir.path().join(ERROR_LOG)).unwrap();
        assert!(content.contains("stdin was not JSON"));
    }
}
