use std::sync::OnceLock;

use regex::Regex;

use super::patterns::{self, AdvisoryChecker, Finding};
use super::types::{HookEnv, HookInput, HookName, HookOutput, WriteEvent};
use super::utils::{self, TestScope};

const STATE_NAME: &str = "git";

const BINARY_EXTENSIONS: &[&str] = &[
    "zip", "tar", "gz", "bz2", "7z", "rar",
    "exe", "dll", "so", "dylib",
    "mp4", "avi", "mov", "mkv", "wmv",
    "mp3", "wav", "flac", "aac",
    "psd", "ai", "sketch",
    "woff", "woff2", "ttf", "otf",
    "sqlite", "db",
    "jar", "war", "class",
    "o", "a", "obj",
    "iso", "dmg", "pkg",
];

/// Prose formats where marker-like lines are legitimate.
const PROSE_EXTENSIONS: &[&str] = &["md", "mdx", "txt", "rst"];

const ENV_REMEDIATION: &str = "Claudia: Writing directly to .env file detected.

.env files should be gitignored and managed locally. Instead:
  - Create a .env.example with placeholder values
  - Add .env to .gitignore
  - Document required variables in README

If this is intentional for local development, rename to .env.example or .env.template.";

const CONFLICT_REMEDIATION: &str = "Claudia: Merge conflict markers detected in code.

Found <<<<<<< / ======= / >>>>>>> markers. These indicate an unresolved merge conflict.
Resolve the conflict before writing the file.";

fn conflict_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(<{7}\s|={7}\s*$|>{7}\s)").ok())
        .as_ref()
}

/// A live dotenv file outside any test tree.
pub fn is_live_env_file(file_path: &str) -> bool {
    let base = utils::basename(file_path);
    let env_named = base == ".env" || (base.starts_with(".env.") && !utils::is_test_path(base, TestScope::EnvTemplate));
    env_named && !utils::is_test_path(file_path, TestScope::Directory)
}

pub fn has_conflict_markers(file_path: &str, content: &str) -> bool {
    !PROSE_EXTENSIONS.contains(&utils::extension(file_path).as_str())
        && conflict_re().is_some_and(|re| re.is_match(content))
}

/// The blocking outcome for this input, if any. The dotenv gate looks at the
/// destination alone, so it fires even for empty content.
pub fn evaluate(input: &HookInput) -> Option<HookOutput> {
    let event = WriteEvent::target(input)?;

    if is_live_env_file(&event.file_path) {
        return Some(HookOutput::block(ENV_REMEDIATION.to_string()));
    }

    if !event.content.is_empty() && has_conflict_markers(&event.file_path, &event.content) {
        return Some(HookOutput::block(CONFLICT_REMEDIATION.to_string()));
    }

    None
}

/// Advisory half: binary artefacts that belong in LFS or object storage.
pub struct GitHygieneChecker;

impl AdvisoryChecker for GitHygieneChecker {
    fn hook(&self) -> HookName {
        HookName::CheckGitHygiene
    }

    fn state_name(&self) -> &'static str {
        STATE_NAME
    }

    fn is_relevant(&self, event: &WriteEvent) -> bool {
        BINARY_EXTENSIONS.contains(&utils::extension(&event.file_path).as_str())
    }

    fn findings(&self, event: &WriteEvent) -> Vec<Finding> {
        let ext = std::path::Path::new(&event.file_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        vec![Finding::new(
            "binary_file",
            format!("Binary file (.{})", ext),
            "Consider using Git LFS for large binary files, or storing them externally (S3, CDN).",
        )]
    }

    fn heading(&self, _event: &WriteEvent) -> String {
        "Claudia noticed a git hygiene concern:".to_string()
    }

    fn color(&self) -> Option<u8> {
        Some(utils::COLOR_NOTICE)
    }
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    if let Some(block) = evaluate(input) {
        return Ok(block);
    }
    patterns::handle_advisory(&GitHygieneChecker, input, env)
}
