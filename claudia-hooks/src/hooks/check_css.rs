use std::sync::OnceLock;

use regex::Regex;

use super::patterns::{AdvisoryChecker, Finding, MatchFlags, Rule, Ruleset};
use super::types::{HookEnv, HookInput, HookName, HookOutput, WriteEvent};
use super::{patterns, utils};

const STYLESHEET_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "styl", "pcss"];
const COMPONENT_EXTENSIONS: &[&str] = &["tsx", "jsx", "vue", "svelte", "astro"];

/// Basename fragments of files where literal colours are the point.
const THEME_FILE_MARKERS: &[&str] = &[
    "theme",
    "tokens",
    "variables",
    "colors",
    "palette",
    "global.css",
    "tailwind",
];

const RULES: &[Rule] = &[
    Rule {
        id: "important",
        pattern: r"!important",
        suppress: None,
        description: "!important usage detected",
        advice: "!important overrides all specificity and makes styles hard to maintain. Fix the specificity conflict instead.",
    },
    Rule {
        id: "z_index_high",
        pattern: r"z-index:\s*(?:9{3,}|[1-9]\d{3,})",
        suppress: None,
        description: "Extremely high z-index",
        advice: "z-index values like 9999 create an arms race. Use a z-index scale (10, 20, 30...) or CSS variables.",
    },
    Rule {
        id: "hardcoded_color",
        pattern: r"(?:color|background(?:-color)?|border(?:-color)?)\s*:\s*#[0-9a-fA-F]{3,8}\s*[;\n]",
        suppress: None,
        description: "Hardcoded color value",
        advice: "Use CSS custom properties (var(--color-name)) or design tokens instead of hardcoded hex values for maintainability.",
    },
    Rule {
        id: "universal_reset",
        pattern: r"\*\s*\{[^}]*(?:margin|padding)\s*:\s*0",
        suppress: None,
        description: "Universal selector reset",
        advice: "Resetting all margins/padding with * {} is expensive and can break components. Use a targeted reset or normalize.css.",
    },
    Rule {
        id: "fixed_dimensions",
        pattern: r"(?:width|height)\s*:\s*\d+px\s*[;\n].*(?:width|height)\s*:\s*\d+px",
        suppress: None,
        description: "Fixed pixel dimensions on layout",
        advice: "Fixed px widths can break responsiveness. Consider max-width, min-width, or relative units (%, rem, vw).",
    },
    Rule {
        id: "css_import",
        pattern: r#"@import\s+(?:url\()?["'](?!.*\.css)"#,
        suppress: None,
        description: "@import in CSS",
        advice: "@import creates extra HTTP requests and blocks rendering. Use your bundler's import or <link> tags instead.",
    },
    Rule {
        id: "float_layout",
        pattern: r"float\s*:\s*(?:left|right)",
        suppress: None,
        description: "Float-based layout",
        advice: "Floats for layout are legacy. Use flexbox or grid instead. They're easier and more predictable.",
    },
    Rule {
        id: "manual_centering",
        pattern: r"(?:top|left|right|bottom)\s*:\s*50%.*transform\s*:\s*translate",
        suppress: None,
        description: "Manual centering with position + transform",
        advice: "Consider using flexbox (display: flex; align-items: center; justify-content: center) or grid (place-items: center) for cleaner centering.",
    },
];

fn ruleset() -> &'static Ruleset {
    static SET: OnceLock<Ruleset> = OnceLock::new();
    SET.get_or_init(|| {
        Ruleset::compile(
            RULES,
            MatchFlags {
                dot_matches_new_line: true,
                ..MatchFlags::default()
            },
        )
    })
}

fn style_token_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"styled|css`|className=|class=|<style").ok())
        .as_ref()
}

fn is_theme_file(file_path: &str) -> bool {
    let base = utils::basename(file_path).to_lowercase();
    THEME_FILE_MARKERS.iter().any(|m| base.contains(m))
}

/// CSS smells in stylesheets and in component files that carry styles.
pub struct CssChecker;

impl AdvisoryChecker for CssChecker {
    fn hook(&self) -> HookName {
        HookName::CheckCss
    }

    fn state_name(&self) -> &'static str {
        "css"
    }

    fn is_relevant(&self, event: &WriteEvent) -> bool {
        let ext = utils::extension(&event.file_path);
        if STYLESHEET_EXTENSIONS.contains(&ext.as_str()) {
            return true;
        }
        COMPONENT_EXTENSIONS.contains(&ext.as_str()) && style_token_re().is_some_and(|re| re.is_match(&event.content))
    }

    fn findings(&self, event: &WriteEvent) -> Vec<Finding> {
        let theme = is_theme_file(&event.file_path);
        ruleset().check_filtered(&event.content, |id| theme && id == "hardcoded_color")
    }

    fn heading(&self, _event: &WriteEvent) -> String {
        "Claudia noticed some CSS patterns worth reviewing:".to_string()
    }
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    patterns::handle_advisory(&CssChecker, input, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn write(path: &str, content: &str) -> HookInput {
        HookInput::new(json!({
            "session_id": "s1",
            "tool_name": "Write",
            "tool_input": {"file_path": path, "content": content}
        }))
    }

    fn message(out: &HookOutput) -> String {
        let v: Value = serde_json::from_str(&out.stdout).unwrap();
        v["systemMessage"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_important_warns_per_file() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());

        let a = handle(&write("src/a.css", ".x { color: red !important; }"), &env).unwrap();
        assert!(message(&a).contains("!important"));
        let a_again = handle(&write("src/a.css", ".x { color: red !important; }"), &env).unwrap();
        assert!(a_again.stdout.is_empty());
        let b = handle(&write("src/b.css", ".y { margin: 0 !important; }"), &env).unwrap();
        assert!(message(&b).contains("!important"));
    }

    #[test]
    fn test_component_without_style_tokens_skipped() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let input = write("src/App.tsx", "const x = 'z-index: 99999 !important';");
        assert!(handle(&input, &env).unwrap().stdout.is_empty());
    }

    #[test]
    fn test_component_with_style_tokens_checked() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let input = write(
            "src/App.tsx",
            "const Box = styled.div`\n  float: left;\n`;",
        );
        assert!(message(&handle(&input, &env).unwrap()).contains("Float-based layout"));
    }

    #[test]
    fn test_theme_file_allows_hardcoded_colors() {
        let theme = WriteEvent {
            session_id: "s1".into(),
            tool_name: "Write".into(),
            file_path: "src/theme.css".into(),
            content: ".a { color: #ff0000; }".into(),
        };
        assert!(CssChecker.findings(&theme).is_empty());

        let plain = WriteEvent {
            file_path: "src/button.css".into(),
            ..theme
        };
        let found = CssChecker.findings(&plain);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "hardcoded_color");
    }

    #[test]
    fn test_fixed_dimensions_span_lines() {
        let found = ruleset().check(".a {\n  width: 300px;\n}\n.b {\n  height: 200px;\n}");
        assert!(found.iter().any(|f| f.id == "fixed_dimensions"));
    }

    #[test]
    fn test_css_import_of_stylesheet_is_fine() {
        assert!(ruleset().check("@import 'reset.css';").is_empty());
        let found = ruleset().check("@import 'mixins';");
        assert_eq!(found[0].id, "css_import");
    }

    #[test]
    fn test_non_css_file_skipped() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let input = write("src/main.py", "x = '!important'");
        assert!(handle(&input, &env).unwrap().stdout.is_empty());
    }

    #[test]
    fn test_style_token_pattern_compiles() {
        assert!(style_token_re().is_some_and(|re| re.is_match("<div className=\"x\">")));
    }
}
