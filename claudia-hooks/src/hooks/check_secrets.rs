//! Blocking gate for credentials written into source files.
//!
//! A match always blocks with exit 2, however many times the same secret is
//! written. Nothing is persisted.

use std::sync::OnceLock;

use super::patterns::{Finding, MatchFlags, Rule, Ruleset};
use super::types::{HookEnv, HookInput, HookOutput, WriteEvent};
use super::utils::{self, TestScope};

macro_rules! secret {
    ($id:literal, $pattern:literal, $description:literal) => {
        Rule {
            id: $id,
            pattern: $pattern,
            suppress: None,
            description: $description,
            advice: "",
        }
    };
}

const RULES: &[Rule] = &[
    secret!("aws_key", r"AKIA[0-9A-Z]{16}", "AWS Access Key ID detected"),
    secret!("aws_secret", r"[0-9a-zA-Z/+]{40}(?=.*AWS)", "AWS Secret Access Key detected"),
    secret!("sk_key", r"sk-[a-zA-Z0-9]{20,}", "OpenAI/Stripe-style secret key detected"),
    secret!("github_pat", r"ghp_[a-zA-Z0-9]{36}", "GitHub personal access token detected"),
    secret!("github_oauth", r"gho_[a-zA-Z0-9]{36}", "GitHub OAuth token detected"),
    secret!("gitlab_pat", r"glpat-[a-zA-Z0-9\-]{20,}", "GitLab personal access token detected"),
    secret!("slack_token", r"xox[bpras]-[a-zA-Z0-9\-]{10,}", "Slack token detected"),
    secret!("private_key", r"-----BEGIN (?:RSA |EC |DSA |OPENSSH )?PRIVATE KEY-----", "Private key detected"),
    secret!("password", r#"password\s*[=:]\s*["'][^"']{8,}["']"#, "Hardcoded password detected"),
    secret!("secret", r#"secret\s*[=:]\s*["'][^"']{8,}["']"#, "Hardcoded secret detected"),
    secret!("api_key", r#"api[_-]?key\s*[=:]\s*["'][a-zA-Z0-9]{16,}["']"#, "Hardcoded API key detected"),
    secret!("mongo_uri", r"mongodb(?:\+srv)?://[^/\s]+:[^@\s]+@", "MongoDB connection string with credentials"),
    secret!("pg_uri", r"postgres(?:ql)?://[^/\s]+:[^@\s]+@", "PostgreSQL connection string with credentials"),
    secret!("mysql_uri", r"mysql://[^/\s]+:[^@\s]+@", "MySQL connection string with credentials"),
];

fn ruleset() -> &'static Ruleset {
    static SET: OnceLock<Ruleset> = OnceLock::new();
    SET.get_or_init(|| Ruleset::compile(RULES, MatchFlags::CASE_SENSITIVE))
}

/// Secret categories present in a non-test write.
pub fn scan(event: &WriteEvent) -> Vec<Finding> {
    if utils::is_test_path(&event.file_path, TestScope::Material) {
        return Vec::new();
    }
    ruleset().check(&event.content)
}

fn remediation(file_path: &str, found: &[Finding]) -> String {
    let c = |text: &str| utils::colorize(utils::COLOR_NOTICE, text);
    let mut lines = Vec::new();
    if let [only] = found {
        lines.push(c(&format!("Claudia: {} in {}.", only.description, file_path)));
    } else {
        lines.push(c(&format!("Claudia: Multiple secrets detected in {}:", file_path)));
        for f in found {
            lines.push(c(&format!("  - {}", f.description)));
        }
    }
    lines.push(String::new());
    lines.push(c("Secrets should never be hardcoded in source files. Use:\n  \
         - Environment variables (.env file, gitignored)\n  \
         - A secret manager (AWS SSM, Vault, Doppler)\n  \
         - CI/CD secrets for pipelines"));
    lines.push(String::new());
    lines.push(c(
        "If this is intentionally a test fixture or example, rename the file to include 'test', 'example', or 'fixture'.",
    ));
    lines.join("\n")
}

/// The blocking outcome for this input, if any.
pub fn evaluate(input: &HookInput) -> Option<HookOutput> {
    let event = WriteEvent::from_hook_input(input)?;
    let found = scan(&event);
    if found.is_empty() {
        return None;
    }
    Some(HookOutput::block(remediation(&event.file_path, &found)))
}

pub fn handle(input: &HookInput, _env: &HookEnv) -> Result<HookOutput, String> {
    Ok(evaluate(input).unwrap_or_else(HookOutput::empty))
}
