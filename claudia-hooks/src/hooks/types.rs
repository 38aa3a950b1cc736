use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::utils;

/// Every hook the `claudia hook <name>` entry point can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookName {
    CheckAccessibility,
    CheckCss,
    CheckDeps,
    CheckDockerfile,
    CheckLicense,
    CheckPractices,
    CheckSecrets,
    CheckGitHygiene,
    PreToolUse,
    Stop,
    Milestones,
    RunSuggest,
    NextSteps,
    Teach,
    SessionTips,
    CompactTip,
    PromptCoach,
}

impl HookName {
    /// Parse a hook name from a CLI argument (case-insensitive).
    /// Kebab, snake and PascalCase spellings are accepted, as are the host's
    /// lifecycle event names for the hooks that own an event outright.
    pub fn from_arg(s: &str) -> Option<HookName> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "checkaccessibility" | "a11y" => Some(HookName::CheckAccessibility),
            "checkcss" => Some(HookName::CheckCss),
            "checkdeps" => Some(HookName::CheckDeps),
            "checkdockerfile" => Some(HookName::CheckDockerfile),
            "checklicense" => Some(HookName::CheckLicense),
            "checkpractices" => Some(HookName::CheckPractices),
            "checksecrets" => Some(HookName::CheckSecrets),
            "checkgithygiene" => Some(HookName::CheckGitHygiene),
            "pretooluse" => Some(HookName::PreToolUse),
            "stop" | "stopdispatch" => Some(HookName::Stop),
            "milestones" => Some(HookName::Milestones),
            "runsuggest" => Some(HookName::RunSuggest),
            "nextsteps" => Some(HookName::NextSteps),
            "teach" => Some(HookName::Teach),
            "sessiontips" | "sessionstart" => Some(HookName::SessionTips),
            "compacttip" | "precompact" => Some(HookName::CompactTip),
            "promptcoach" | "userpromptsubmit" => Some(HookName::PromptCoach),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HookName::CheckAccessibility => "check-accessibility",
            HookName::CheckCss => "check-css",
            HookName::CheckDeps => "check-deps",
            HookName::CheckDockerfile => "check-dockerfile",
            HookName::CheckLicense => "check-license",
            HookName::CheckPractices => "check-practices",
            HookName::CheckSecrets => "check-secrets",
            HookName::CheckGitHygiene => "check-git-hygiene",
            HookName::PreToolUse => "pre-tool-use",
            HookName::Stop => "stop",
            HookName::Milestones => "milestones",
            HookName::RunSuggest => "run-suggest",
            HookName::NextSteps => "next-steps",
            HookName::Teach => "teach",
            HookName::SessionTips => "session-tips",
            HookName::CompactTip => "compact-tip",
            HookName::PromptCoach => "prompt-coach",
        }
    }

    pub fn all() -> &'static [HookName] {
        &[
            HookName::CheckAccessibility,
            HookName::CheckCss,
            HookName::CheckDeps,
            HookName::CheckDockerfile,
            HookName::CheckLicense,
            HookName::CheckPractices,
            HookName::CheckSecrets,
            HookName::CheckGitHygiene,
            HookName::PreToolUse,
            HookName::Stop,
            HookName::Milestones,
            HookName::RunSuggest,
            HookName::NextSteps,
            HookName::Teach,
            HookName::SessionTips,
            HookName::CompactTip,
            HookName::PromptCoach,
        ]
    }
}

/// Raw JSON input from hook stdin.
/// Kept as a `serde_json::Value`; each handler pulls the fields it needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookInput {
    #[serde(flatten)]
    pub data: Value,
}

impl HookInput {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// The host's session id, `"default"` when absent.
    pub fn session_id(&self) -> &str {
        self.str_field("session_id").unwrap_or("default")
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }
}

/// Tools whose input carries file content.
pub const WRITE_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit"];

/// Typed view of a PreToolUse write event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteEvent {
    pub session_id: String,
    pub tool_name: String,
    pub file_path: String,
    /// Text under inspection, see [`utils::extract_content`].
    pub content: String,
}

impl WriteEvent {
    /// Returns `None` for non-write tools, a missing path, or empty content.
    pub fn from_hook_input(input: &HookInput) -> Option<WriteEvent> {
        Self::target(input).filter(|ev| !ev.content.is_empty())
    }

    /// Like [`WriteEvent::from_hook_input`] but keeps events with empty
    /// content, for gates that care about the destination alone.
    pub fn target(input: &HookInput) -> Option<WriteEvent> {
        let tool_name = input.str_field("tool_name").unwrap_or("");
        if !WRITE_TOOLS.contains(&tool_name) {
            return None;
        }
        let tool_input = input.data.get("tool_input")?;
        let file_path = tool_input
            .get("file_path")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        if file_path.is_empty() {
            return None;
        }
        Some(WriteEvent {
            session_id: input.session_id().to_string(),
            tool_name: tool_name.to_string(),
            file_path: file_path.to_string(),
            content: utils::extract_content(tool_name, tool_input),
        })
    }

    pub fn is_full_write(&self) -> bool {
        self.tool_name == "Write"
    }
}

/// Result returned by a hook handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOutput {
    /// One JSON line for the host, or empty.
    pub stdout: String,
    /// Remediation text; only set for blocking outcomes.
    pub stderr: String,
    /// Process exit code: 0 = success/graceful, 2 = intentional block.
    pub exit_code: i32,
}

impl HookOutput {
    pub fn ok(stdout: String) -> Self {
        Self {
            stdout,
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn block(stderr: String) -> Self {
        Self {
            stdout: String::new(),
            stderr,
            exit_code: 2,
        }
    }

    pub fn empty() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// Serialize an advisory response. Both fields empty means silence.
    pub fn advisory(additional_context: Option<String>, system_message: Option<String>) -> Self {
        let mut obj = serde_json::Map::new();
        if let Some(ctx) = additional_context.filter(|s| !s.is_empty()) {
            obj.insert("additionalContext".to_string(), Value::String(ctx));
        }
        if let Some(msg) = system_message.filter(|s| !s.is_empty()) {
            obj.insert("systemMessage".to_string(), Value::String(msg));
        }
        if obj.is_empty() {
            return Self::empty();
        }
        Self::ok(Value::Object(obj).to_string())
    }

    pub fn is_block(&self) -> bool {
        self.exit_code == 2
    }
}

/// Filesystem anchors a hook runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEnv {
    /// Per-installation state root (`~/.claude`).
    pub state_dir: PathBuf,
    pub home: PathBuf,
    pub cwd: PathBuf,
}

impl HookEnv {
    pub fn from_process() -> Self {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            state_dir: utils::resolve_claude_dir(),
            home,
            cwd,
        }
    }

    /// Everything under `root`: state in `root/.claude`, home and cwd at `root`.
    pub fn rooted(root: &Path) -> Self {
        Self {
            state_dir: root.join(".claude"),
            home: root.to_path_buf(),
            cwd: root.to_path_buf(),
        }
    }
}
