use std::sync::OnceLock;

use super::patterns::{self, AdvisoryChecker, Finding, MatchFlags, Rule, Ruleset};
use super::types::{HookEnv, HookInput, HookName, HookOutput, WriteEvent};
use super::utils::{self, TestScope};

const EXTENSIONS: &[&str] = &["html", "htm", "jsx", "tsx", "vue", "svelte", "astro"];

const RULES: &[Rule] = &[
    Rule {
        id: "a11y_img_alt",
        pattern: r"<img\b(?![^>]*\balt\b)",
        suppress: None,
        description: "Image without alt attribute",
        advice: "All `<img>` elements need an `alt` attribute. Use descriptive text, or `alt=\"\"` for decorative images.",
    },
    Rule {
        id: "a11y_input_label",
        pattern: r#"<input\b(?![^>]*\b(?:aria-label|aria-labelledby|id\s*=\s*["'][^"']+["'])\b)(?![^>]*\btype\s*=\s*["'](?:hidden|submit|button|reset)["'])"#,
        suppress: Some(r"<label\b"),
        description: "Form input without label or aria-label",
        advice: "Inputs need associated labels. Use `<label htmlFor>`, `aria-label`, or `aria-labelledby`.",
    },
    Rule {
        id: "a11y_icon_button",
        pattern: r"<button\b(?![^>]*\b(?:aria-label|aria-labelledby)\b)[^>]*>\s*<(?:img|svg|i|span\s+class)",
        suppress: None,
        description: "Icon-only button without accessible label",
        advice: "Buttons with only icons need `aria-label` to describe their action (e.g., `aria-label=\"Close\"`).",
    },
    Rule {
        id: "a11y_div_click",
        pattern: r"onClick\s*=\s*\{[^}]+\}\s*(?:className|style)",
        suppress: Some(r"<(?:button|a|input|select|textarea)\b"),
        description: "Click handler on non-interactive element",
        advice: "Use `<button>` for clickable elements, not `<div onClick>`. Buttons are keyboard-accessible and announced by screen readers.",
    },
    Rule {
        id: "a11y_tabindex",
        pattern: r#"tabIndex\s*=\s*["']?[1-9]"#,
        suppress: None,
        description: "Positive tabIndex value",
        advice: "Avoid positive `tabIndex` values. They override natural tab order and confuse keyboard users. Use `tabIndex={0}` or `-1`.",
    },
    Rule {
        id: "a11y_anchor_href",
        pattern: r"<a\b(?![^>]*\bhref\b)",
        suppress: None,
        description: "Anchor tag without href",
        advice: "Use `<button>` for actions, `<a href>` for navigation. An `<a>` without `href` is not keyboard-accessible.",
    },
    Rule {
        id: "a11y_autofocus",
        pattern: r"autoFocus|autofocus",
        suppress: None,
        description: "autoFocus attribute used",
        advice: "Avoid `autoFocus` -- it can disorient screen reader users and disrupt keyboard navigation. Let users control focus.",
    },
    Rule {
        id: "a11y_empty_heading",
        pattern: r"<(?:h[1-6])\b[^>]*>\s*</(?:h[1-6])>",
        suppress: None,
        description: "Empty heading element",
        advice: "Headings should contain text content. Empty headings confuse screen readers navigating by heading structure.",
    },
];

fn ruleset() -> &'static Ruleset {
    static SET: OnceLock<Ruleset> = OnceLock::new();
    SET.get_or_init(|| Ruleset::compile(RULES, MatchFlags::IGNORE_CASE))
}

/// Markup accessibility smells in HTML and component files.
pub struct AccessibilityChecker;

impl AdvisoryChecker for AccessibilityChecker {
    fn hook(&self) -> HookName {
        HookName::CheckAccessibility
    }

    fn state_name(&self) -> &'static str {
        "a11y"
    }

    fn is_relevant(&self, event: &WriteEvent) -> bool {
        EXTENSIONS.contains(&utils::extension(&event.file_path).as_str())
            && !utils::is_test_path(&event.file_path, TestScope::Source)
    }

    fn findings(&self, event: &WriteEvent) -> Vec<Finding> {
        ruleset().check(&event.content)
    }

    fn heading(&self, _event: &WriteEvent) -> String {
        "Claudia noticed some accessibility concerns:".to_string()
    }
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    patterns::handle_advisory(&AccessibilityChecker, input, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn env(dir: &TempDir) -> HookEnv {
        HookEnv::rooted(dir.path())
    }

    fn write(path: &str, content: &str) -> HookInput {
        HookInput::new(json!({
            "session_id": "s1",
            "tool_name": "Write",
            "tool_input": {"file_path": path, "content": content}
        }))
    }

    #[test]
    fn test_img_without_alt_warns_once() {
        let dir = TempDir::new().unwrap();
        let input = write("/app/page.html", r#"<img src="x.jpg">"#);

        let first = handle(&input, &env(&dir)).unwrap();
        assert_eq!(first.exit_code, 0);
        let v: Value = serde_json::from_str(&first.stdout).unwrap();
        assert!(v["systemMessage"].as_str().unwrap().contains("alt"));

        let second = handle(&input, &env(&dir)).unwrap();
        assert_eq!(second.exit_code, 0);
        assert!(second.stdout.is_empty());
    }

    #[test]
    fn test_img_with_alt_is_clean() {
        let dir = TempDir::new().unwrap();
        let input = write("/app/page.html", r#"<img src="x.jpg" alt="A cat">"#);
        assert!(handle(&input, &env(&dir)).unwrap().stdout.is_empty());
    }

    #[test]
    fn test_irrelevant_extension_skipped() {
        let dir = TempDir::new().unwrap();
        let input = write("/app/readme.txt", r#"<img src="x.jpg">"#);
        assert!(handle(&input, &env(&dir)).unwrap().stdout.is_empty());
    }

    #[test]
    fn test_test_files_skipped() {
        let dir = TempDir::new().unwrap();
        let input = write("/app/Button.test.tsx", r#"<img src="x.jpg">"#);
        assert!(handle(&input, &env(&dir)).unwrap().stdout.is_empty());
    }

    #[test]
    fn test_label_suppresses_input_rule() {
        let found = ruleset().check(r#"<label>Name</label><input name="n">"#);
        assert!(found.iter().all(|f| f.id != "a11y_input_label"));
        let found = ruleset().check(r#"<input name="n">"#);
        assert!(found.iter().any(|f| f.id == "a11y_input_label"));
    }

    #[test]
    fn test_hidden_input_is_fine() {
        let found = ruleset().check(r#"<input type="hidden" name="csrf">"#);
        assert!(found.iter().all(|f| f.id != "a11y_input_label"));
    }

    #[test]
    fn test_multiple_findings_in_one_message() {
        let dir = TempDir::new().unwrap();
        let input = write("/app/App.jsx", "<a onClick={go}>Go</a>\n<h2></h2>\n<div tabIndex=\"3\" autoFocus>");
        let out = handle(&input, &env(&dir)).unwrap();
        let v: Value = serde_json::from_str(&out.stdout).unwrap();
        let msg = v["systemMessage"].as_str().unwrap();
        assert!(msg.contains("accessibility concerns"));
        assert!(msg.contains("Anchor tag without href"));
        assert!(msg.contains("Empty heading element"));
        assert!(msg.contains("Positive tabIndex value"));
        assert!(msg.contains("autoFocus attribute used"));
    }
}
