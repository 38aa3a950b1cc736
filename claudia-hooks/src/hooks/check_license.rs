use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::patterns::{AdvisoryChecker, Finding};
use super::types::{HookEnv, HookInput, HookName, HookOutput, WriteEvent};
use super::patterns;

/// How far up from the written file to look for the project manifest.
const MAX_MANIFEST_DEPTH: usize = 10;

const PERMISSIVE_LICENSES: &[&str] = &["MIT", "ISC", "BSD", "Apache", "Unlicense", "0BSD"];

struct CopyleftPackage {
    name: &'static str,
    license: &'static str,
    /// `None` for packages listed only as reminders; those never warn.
    alternative: Option<&'static str>,
}

const COPYLEFT_PACKAGES: &[CopyleftPackage] = &[
    CopyleftPackage { name: "readline", license: "GPL-3.0", alternative: Some("Use `@ptkdev/readline` or built-in Node.js readline") },
    CopyleftPackage { name: "ghostscript", license: "AGPL-3.0", alternative: Some("Consider alternatives or check AGPL compliance") },
    CopyleftPackage { name: "mongodb-memory-server", license: "MIT", alternative: None },
    CopyleftPackage { name: "mysql", license: "MIT", alternative: None },
    CopyleftPackage { name: "grafana", license: "AGPL-3.0", alternative: Some("Self-hosting Grafana requires AGPL compliance") },
    CopyleftPackage { name: "minio", license: "AGPL-3.0", alternative: Some("AGPL requires sharing source if you modify and serve it") },
    CopyleftPackage { name: "mongodb", license: "SSPL", alternative: Some("MongoDB SSPL requires sharing all service code if you offer MongoDB as a service") },
    CopyleftPackage { name: "mongoose", license: "MIT", alternative: None },
    CopyleftPackage { name: "caniuse-lite", license: "CC-BY-4.0", alternative: None },
];

const GPL_ADVICE: &str = "Copyleft licenses require you to release derivative works under the same license. Verify compatibility with your project license.";

fn gpl_line_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)["']([^"']+)["'].*(?:GPL|AGPL|SSPL)"#).ok())
        .as_ref()
}

fn package_re(name: &str) -> Option<Regex> {
    Regex::new(&format!(r#"["']{}["']"#, regex::escape(name))).ok()
}

fn is_permissive(license: &str) -> bool {
    PERMISSIVE_LICENSES.iter().any(|l| license.contains(l))
}

/// `license` field of the nearest `package.json` above `file_path`.
/// An unreadable manifest ends the search with an empty license.
pub fn project_license(file_path: &str) -> String {
    let mut dir = match Path::new(file_path).parent() {
        Some(d) => d.to_path_buf(),
        None => return String::new(),
    };
    for _ in 0..MAX_MANIFEST_DEPTH {
        let manifest = dir.join("package.json");
        if manifest.exists() {
            return std::fs::read_to_string(&manifest)
                .ok()
                .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
                .and_then(|pkg| pkg.get("license").and_then(|l| l.as_str()).map(str::to_string))
                .unwrap_or_default();
        }
        if !dir.pop() {
            break;
        }
    }
    String::new()
}

/// The permissive license in force, if any: the on-disk manifest first, then
/// the `license` field of a full `package.json` write.
fn permissive_license(event: &WriteEvent) -> Option<String> {
    let on_disk = project_license(&event.file_path);
    if is_permissive(&on_disk) {
        return Some(on_disk);
    }
    if !event.is_full_write() {
        return None;
    }
    serde_json::from_str::<Value>(&event.content)
        .ok()
        .and_then(|pkg| pkg.get("license").and_then(|l| l.as_str()).map(str::to_string))
        .filter(|l| is_permissive(l))
}

/// Copyleft dependencies landing in `package.json`.
pub struct LicenseChecker;

impl AdvisoryChecker for LicenseChecker {
    fn hook(&self) -> HookName {
        HookName::CheckLicense
    }

    fn state_name(&self) -> &'static str {
        "license"
    }

    fn is_relevant(&self, event: &WriteEvent) -> bool {
        event.file_path.ends_with("package.json")
    }

    fn findings(&self, event: &WriteEvent) -> Vec<Finding> {
        let mut found = Vec::new();
        if gpl_line_re().is_some_and(|re| event.content.lines().any(|line| re.is_match(line))) {
            found.push(Finding::new(
                "gpl_in_content",
                "GPL/AGPL/SSPL reference found",
                format!(": {}", GPL_ADVICE),
            ));
        }

        let permissive = permissive_license(event);
        for pkg in COPYLEFT_PACKAGES {
            let Some(alternative) = pkg.alternative else {
                continue;
            };
            if !package_re(pkg.name).is_some_and(|re| re.is_match(&event.content)) {
                continue;
            }
            let mut detail = String::new();
            if let Some(ref license) = permissive {
                detail.push_str(&format!(
                    ": This is copyleft-licensed, which may conflict with your {} license.",
                    license
                ));
            }
            detail.push(' ');
            detail.push_str(alternative);
            found.push(Finding::new(
                format!("license_{}", pkg.name),
                format!("**{}** ({})", pkg.name, pkg.license),
                detail,
            ));
        }
        found
    }

    fn heading(&self, _event: &WriteEvent) -> String {
        "Claudia noticed some license concerns:".to_string()
    }

    fn render_line(&self, finding: &Finding) -> String {
        format!("- {}{}", finding.description, finding.advice)
    }
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    patterns::handle_advisory(&LicenseChecker, input, env)
}
