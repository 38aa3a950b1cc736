use std::sync::OnceLock;

use super::patterns::{AdvisoryChecker, Finding, MatchFlags, Rule, Ruleset};
use super::types::{HookEnv, HookInput, HookName, HookOutput, WriteEvent};
use super::patterns;

/// Matches a package name as a quoted JSON token.
macro_rules! package {
    ($id:literal, $name:literal, $why:literal) => {
        Rule {
            id: $id,
            pattern: concat!(r#"["']"#, $name, r#"["']"#),
            suppress: None,
            description: $name,
            advice: $why,
        }
    };
}

const RULES: &[Rule] = &[
    package!("dep_request", "request", "Deprecated since 2020. Use `node-fetch`, `undici`, or built-in `fetch`"),
    package!("dep_moment", "moment", "Legacy, large bundle (300KB+). Use `date-fns`, `dayjs`, or `Temporal` API"),
    package!("dep_lodash_full", "lodash", "Usually unnecessary, large bundle. Use native JS methods or `lodash-es` for tree-shaking"),
    package!("dep_underscore", "underscore", "Legacy, superseded by native JS. Use native array/object methods"),
    package!("dep_node_uuid", "node-uuid", "Renamed package. Use `uuid` instead"),
    package!("dep_colors", "colors", "Was compromised (supply chain attack). Use `chalk` or `picocolors`"),
    package!("dep_faker", "faker", "Was sabotaged by maintainer. Use `@faker-js/faker` (community fork)"),
    package!("dep_event_stream", "event-stream", "Was compromised (supply chain attack). Avoid, or use `readable-stream`"),
    package!("dep_node_ipc", "node-ipc", "Was sabotaged by maintainer (protestware). Use alternatives like `node-ipc-fork`"),
    package!("dep_querystring", "querystring", "Built into Node.js, deprecated npm package. Use `URLSearchParams` (built-in)"),
    package!("dep_leftpad", "left-pad", "Infamous single-function package. Use `String.prototype.padStart()`"),
    package!("dep_is_odd", "is-odd", "Trivial package, unnecessary dependency. Use `n % 2 !== 0`"),
    package!("dep_is_even", "is-even", "Trivial package, unnecessary dependency. Use `n % 2 === 0`"),
    package!("dep_is_number", "is-number", "Trivial package, unnecessary dependency. Use `typeof n === 'number'` or `Number.isFinite()`"),
    package!("dep_gulp", "gulp", "Legacy build tool. Use `Vite`, `esbuild`, or npm scripts"),
    package!("dep_grunt", "grunt", "Legacy build tool. Use `Vite`, `esbuild`, or npm scripts"),
    package!("dep_bower", "bower", "Deprecated package manager. Use npm or pnpm"),
    package!("dep_tslint", "tslint", "Deprecated in favor of ESLint. Use `eslint` with `@typescript-eslint`"),
    package!("dep_protobufjs", "protobufjs", "Known prototype pollution vulnerabilities. Update to latest version or use `@bufbuild/protobuf`"),
];

fn ruleset() -> &'static Ruleset {
    static SET: OnceLock<Ruleset> = OnceLock::new();
    SET.get_or_init(|| Ruleset::compile(RULES, MatchFlags::CASE_SENSITIVE))
}

/// Deprecated, compromised or trivial npm packages in `package.json`.
pub struct DepsChecker;

impl AdvisoryChecker for DepsChecker {
    fn hook(&self) -> HookName {
        HookName::CheckDeps
    }

    fn state_name(&self) -> &'static str {
        "deps"
    }

    fn is_relevant(&self, event: &WriteEvent) -> bool {
        event.file_path.ends_with("package.json")
    }

    fn findings(&self, event: &WriteEvent) -> Vec<Finding> {
        ruleset().check(&event.content)
    }

    fn heading(&self, _event: &WriteEvent) -> String {
        "Claudia noticed some dependency concerns:".to_string()
    }

    fn color(&self) -> Option<u8> {
        None
    }

    fn render_line(&self, finding: &Finding) -> String {
        format!("- **{}**: {}", finding.description, finding.advice)
    }
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    patterns::handle_advisory(&DepsChecker, input, env)
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

    #[test]
    fn test_moment_flagged_without_colour() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let pkg = r#"{"dependencies": {"moment": "^2.29.0", "react": "^18.0.0"}}"#;
        let out = handle(&write("/app/package.json", pkg), &env).unwrap();
        let v: Value = serde_json::from_str(&out.stdout).unwrap();
        let msg = v["systemMessage"].as_str().unwrap();
        assert!(msg.starts_with("Claudia noticed some dependency concerns:"));
        assert!(msg.contains("- **moment**: Legacy"));
        assert!(!msg.contains('\x1b'));
    }

    #[test]
    fn test_package_names_match_whole_tokens() {
        // "colors-extra" is not "colors"; "lodash-es" is not "lodash"
        let found = ruleset().check(r#"{"dependencies": {"colors-extra": "1", "lodash-es": "4"}}"#);
        assert!(found.is_empty());
    }

    #[test]
    fn test_only_package_json() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let out = handle(&write("/app/deps.json", r#"{"moment": "1"}"#), &env).unwrap();
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn test_edit_is_checked() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let input = HookInput::new(json!({
            "session_id": "s1",
            "tool_name": "Edit",
            "tool_input": {"file_path": "/app/package.json", "old_string": "", "new_string": "\"request\": \"^2.0.0\","}
        }));
        let out = handle(&input, &env).unwrap();
        assert!(out.stdout.contains("request"));
    }
}
