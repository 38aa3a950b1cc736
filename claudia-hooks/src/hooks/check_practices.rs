use std::sync::OnceLock;

use super::patterns::{self, AdvisoryChecker, Finding, MatchFlags, Rule, Ruleset};
use super::types::{HookEnv, HookInput, HookName, HookOutput, WriteEvent};
use super::utils::{self, TestScope};

/// Rules that are noise in test sources.
const RELAXED_IN_TESTS: &[&str] = &["console_log", "todo_marker"];

const RULES: &[Rule] = &[
    Rule {
        id: "eval",
        pattern: r"\beval\s*\(",
        suppress: None,
        description: "eval() usage detected",
        advice: "eval() executes arbitrary code and is a security risk. Use JSON.parse() for data, or find a safer alternative.",
    },
    Rule {
        id: "console_log",
        pattern: r"console\.(log|debug|info|warn|error)\s*\(",
        suppress: None,
        description: "console.log in production code",
        advice: "Consider using a proper logging library (winston, pino) or remove debug logging before shipping.",
    },
    Rule {
        id: "empty_catch",
        pattern: r"catch\s*\([^)]*\)\s*\{\s*\}",
        suppress: None,
        description: "Empty catch block",
        advice: "Swallowing errors silently makes debugging impossible. At minimum, log the error.",
    },
    Rule {
        id: "http_url",
        pattern: r"http://(?!localhost|127\.0\.0\.1|0\.0\.0\.0)",
        suppress: None,
        description: "Non-localhost HTTP URL (not HTTPS)",
        advice: "Use HTTPS for all non-local URLs to prevent man-in-the-middle attacks.",
    },
    Rule {
        id: "sql_injection",
        pattern: r#"["']SELECT\s.*\+\s*(?:req\.|params\.|query\.|body\.|user)"#,
        suppress: None,
        description: "Possible SQL injection via string concatenation",
        advice: "Use parameterized queries or an ORM instead of concatenating user input into SQL.",
    },
    Rule {
        id: "document_write",
        pattern: r"document\.write\s*\(",
        suppress: None,
        description: "document.write() usage",
        advice: "document.write() can cause XSS and performance issues. Use DOM methods (createElement, appendChild).",
    },
    Rule {
        id: "innerhtml",
        pattern: r"\.innerHTML\s*=",
        suppress: None,
        description: "innerHTML assignment",
        advice: "Setting innerHTML with untrusted content enables XSS. Use textContent for plain text, or sanitize with DOMPurify.",
    },
    Rule {
        id: "todo_marker",
        pattern: r"TODO|FIXME|HACK|XXX",
        suppress: None,
        description: "TODO/FIXME marker in new code",
        advice: "Shipping code with TODO markers suggests incomplete work. Address it now or create a tracked issue.",
    },
    Rule {
        id: "chmod_777",
        pattern: r"chmod\s+777",
        suppress: None,
        description: "chmod 777 (world-writable permissions)",
        advice: "777 permissions are a security risk. Use the minimum permissions needed (e.g., 755 for dirs, 644 for files).",
    },
    Rule {
        id: "ssl_disabled",
        pattern: r#"disable.*ssl|verify\s*=\s*False|NODE_TLS_REJECT_UNAUTHORIZED\s*=\s*["']?0"#,
        suppress: None,
        description: "SSL/TLS verification disabled",
        advice: "Disabling SSL verification makes connections vulnerable to MITM attacks. Fix the certificate instead.",
    },
];

fn ruleset() -> &'static Ruleset {
    static SET: OnceLock<Ruleset> = OnceLock::new();
    SET.get_or_init(|| Ruleset::compile(RULES, MatchFlags::CASE_SENSITIVE))
}

/// General code-quality and security smells in any written file.
pub struct PracticesChecker;

impl AdvisoryChecker for PracticesChecker {
    fn hook(&self) -> HookName {
        HookName::CheckPractices
    }

    fn state_name(&self) -> &'static str {
        "practices"
    }

    fn is_relevant(&self, _event: &WriteEvent) -> bool {
        true
    }

    fn findings(&self, event: &WriteEvent) -> Vec<Finding> {
        let in_tests = utils::is_test_path(&event.file_path, TestScope::Source);
        ruleset().check_filtered(&event.content, |id| {
            in_tests && RELAXED_IN_TESTS.contains(&id)
        })
    }

    fn heading(&self, _event: &WriteEvent) -> String {
        "Claudia noticed some patterns worth reviewing:".to_string()
    }

    fn color(&self) -> Option<u8> {
        Some(utils::COLOR_NOTICE)
    }
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    patterns::handle_advisory(&PracticesChecker, input, env)
}
