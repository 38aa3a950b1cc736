use std::io::Read;

use serde_json::{Value, json};

use crate::commands::{project_context, user_config};
use crate::hooks;
use crate::hooks::types::{HookEnv, HookName, HookOutput};
use crate::hooks::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Hook,
    ResolveProject,
    Context,
    SaveContext,
    Projects,
    Config,
    Help,
}

impl Command {
    /// Parse a command name from a CLI argument.
    pub fn from_arg(s: &str) -> Option<Command> {
        match s {
            "hook" => Some(Command::Hook),
            "resolve-project" => Some(Command::ResolveProject),
            "context" => Some(Command::Context),
            "save-context" => Some(Command::SaveContext),
            "projects" => Some(Command::Projects),
            "config" => Some(Command::Config),
            "help" | "--help" | "-h" => Some(Command::Help),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Hook => "hook",
            Command::ResolveProject => "resolve-project",
            Command::Context => "context",
            Command::SaveContext => "save-context",
            Command::Projects => "projects",
            Command::Config => "config",
            Command::Help => "help",
        }
    }

    /// All known canonical command names.
    fn all_names() -> &'static [&'static str] {
        &["hook", "resolve-project", "context", "save-context", "projects", "config", "help"]
    }

    /// Suggest the closest command name for a typo.
    pub fn suggest(input: &str) -> Option<&'static str> {
        closest(input, Self::all_names().iter().copied())
    }
}

fn closest(input: &str, names: impl Iterator<Item = &'static str>) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;
    for name in names {
        let dist = edit_distance(input, name);
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            best = Some((name, dist));
        }
    }
    best.map(|(name, _)| name)
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        dp[0][j] = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1).min(dp[i][j - 1] + 1).min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[a.len()][b.len()]
}

fn unknown(kind: &str, input: &str, suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!("Unknown {}: '{}'. Did you mean '{}'?", kind, input, s),
        None => format!("Unknown {}: '{}'", kind, input),
    }
}

pub fn usage() -> String {
    let hooks: Vec<&str> = HookName::all().iter().map(|h| h.name()).collect();
    format!(
        "Usage: claudia <command> [args...]\n\n\
         Commands:\n  \
         hook <name>            run one hook, reading its JSON event from stdin\n  \
         resolve-project        print the project key and root for the working directory\n  \
         context [<key>]        print the project context document\n  \
         save-context <json>    merge a JSON object into the project context\n  \
         projects               print the project registry\n  \
         config                 print the resolved user configuration\n  \
         help                   show this message\n\n\
         Hooks:\n  {}\n",
        hooks.join("\n  ")
    )
}

fn pretty(value: &impl serde::Serialize) -> Result<HookOutput, String> {
    serde_json::to_string_pretty(value)
        .map(HookOutput::ok)
        .map_err(|e| format!("Failed to serialize output: {}", e))
}

fn check_hook_name(hook_name: &str) -> Result<(), String> {
    if HookName::from_arg(hook_name).is_none() {
        let suggestion = closest(hook_name, HookName::all().iter().map(|h| h.name()));
        return Err(unknown("hook", hook_name, suggestion));
    }
    Ok(())
}

/// Read the hook event from `reader`, then run the hook. An unreadable
/// stream is logged and treated like unparsable JSON: exit 0, no output.
pub fn run_hook_from<R: Read>(hook_name: &str, mut reader: R, env: &HookEnv) -> Result<HookOutput, String> {
    check_hook_name(hook_name)?;
    let mut stdin_json = String::new();
    if let Err(e) = reader.read_to_string(&mut stdin_json) {
        utils::log_hook_message(&env.state_dir, &format!("{}: failed to read stdin: {}", hook_name, e));
        return Ok(HookOutput::empty());
    }
    run_hook(hook_name, &stdin_json, env)
}

/// Run one hook against an already-read stdin document.
pub fn run_hook(hook_name: &str, stdin_json: &str, env: &HookEnv) -> Result<HookOutput, String> {
    check_hook_name(hook_name)?;
    let stdin_json = if stdin_json.trim().is_empty() { "{}" } else { stdin_json };
    hooks::dispatcher::dispatch_from_cli(hook_name, stdin_json, env)
}

pub fn run_cli(args: Vec<String>, env: &HookEnv) -> Result<HookOutput, String> {
    if args.len() < 2 {
        return Err(usage());
    }

    match Command::from_arg(args[1].as_str()) {
        Some(Command::Hook) => {
            if args.len() < 3 {
                return Err("Usage: claudia hook <hook-name>".to_string());
            }
            // Hook JSON context from the host
            run_hook_from(&args[2], std::io::stdin().lock(), env)
        }
        Some(Command::ResolveProject) => {
            let resolved = project_context::resolve_project(&env.cwd, &env.home);
            let out = match resolved {
                Some(p) => json!({"key": p.key, "path": p.path.to_string_lossy()}),
                None => json!({"key": Value::Null, "path": Value::Null}),
            };
            Ok(HookOutput::ok(out.to_string()))
        }
        Some(Command::Context) => {
            let key = args.get(2).map(String::as_str);
            pretty(&project_context::load_project_context(env, key))
        }
        Some(Command::SaveContext) => {
            let raw = args
                .get(2)
                .ok_or_else(|| "Usage: claudia save-context '<json-object>'".to_string())?;
            let data = match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => return Err("save-context expects a JSON object".to_string()),
                Err(e) => return Err(format!("Invalid JSON for save-context: {}", e)),
            };
            project_context::save_project_context(env, &data, None, None);
            pretty(&project_context::load_project_context(env, None))
        }
        Some(Command::Projects) => pretty(&project_context::load_registry(&env.state_dir)),
        Some(Command::Config) => pretty(&user_config::load_user_config(env)),
        Some(Command::Help) => Ok(HookOutput::ok(usage())),
        None => Err(unknown("command", &args[1], Command::suggest(&args[1]))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("claudia").chain(list.iter().copied()).map(String::from).collect()
    }

    #[test]
    fn test_run_cli_errors() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        assert!(run_cli(vec!["claudia".into()], &env).unwrap_err().contains("Usage"));
        let err = run_cli(args(&["unknown"]), &env).unwrap_err();
        assert!(err.contains("Unknown command: 'unknown'"), "got: {}", err);
        assert!(run_cli(args(&["hook"]), &env).is_err());
    }

    #[test]
    fn test_command_from_arg_all_variants() {
        for name in Command::all_names() {
            let cmd = Command::from_arg(name).unwrap();
            assert_eq!(cmd.name(), *name, "roundtrip failed for {}", name);
        }
        assert_eq!(Command::from_arg("--help"), Some(Command::Help));
        assert_eq!(Command::from_arg(""), None);
    }

    #[test]
    fn test_command_suggest_typo() {
        assert_eq!(Command::suggest("projcts"), Some("projects"));
        assert_eq!(Command::suggest("confg"), Some("config"));
        assert_eq!(Command::suggest("xylophone"), None);
        let err = run_cli(args(&["projcts"]), &HookEnv::rooted(TempDir::new().unwrap().path())).unwrap_err();
        assert!(err.contains("Did you mean 'projects'"), "got: {}", err);
    }

    #[test]
    fn test_unknown_hook_suggests() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let err = run_hook("check-csss", "{}", &env).unwrap_err();
        assert!(err.contains("Did you mean 'check-css'"), "got: {}", err);
    }

    #[test]
    fn test_run_hook_empty_stdin_is_empty_object() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let out = run_hook("stop", "", &env).unwrap();
        assert_eq!(out, HookOutput::empty());
        assert!(!env.state_dir.join("claudia-hook-errors.log").exists());
    }

    #[test]
    fn test_unreadable_stdin_is_logged() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let invalid_utf8: &[u8] = &[0x7b, 0xff, 0xfe, 0x7d];
        let out = run_hook_from("check-css", invalid_utf8, &env).unwrap();
        assert_eq!(out, HookOutput::empty());
        let log = fs::read_to_string(env.state_dir.join(utils::ERROR_LOG)).unwrap();
        assert!(log.contains("check-css: failed to read stdin"), "got: {}", log);
    }

    #[test]
    fn test_resolve_project_at_home_is_null() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let out = run_cli(args(&["resolve-project"]), &env).unwrap();
        let v: Value = serde_json::from_str(&out.stdout).unwrap();
        assert!(v["key"].is_null() && v["path"].is_null());
    }

    #[test]
    fn test_save_context_then_projects() {
        let dir = TempDir::new().unwrap();
        let repo = dir.path().join("site");
        fs::create_dir_all(repo.join(".git")).unwrap();
        let env = HookEnv {
            cwd: repo.clone(),
            ..HookEnv::rooted(dir.path())
        };

        let saved = run_cli(args(&["save-context", r#"{"experience":"beginner"}"#]), &env).unwrap();
        let ctx: Value = serde_json::from_str(&saved.stdout).unwrap();
        assert_eq!(ctx["experience"], "beginner");
        assert_eq!(ctx["name"], "site");

        let reg: Value = serde_json::from_str(&run_cli(args(&["projects"]), &env).unwrap().stdout).unwrap();
        let key = project_context::project_key(&repo);
        assert_eq!(reg["projects"][key.as_str()]["name"], "site");

        let cfg: Value = serde_json::from_str(&run_cli(args(&["config"]), &env).unwrap().stdout).unwrap();
        assert_eq!(cfg["experience"], "beginner");
        assert_eq!(cfg["proactivity"], "moderate");

        assert!(run_cli(args(&["save-context", "[1]"]), &env).is_err());
    }

    #[test]
    fn test_help_lists_hooks() {
        let dir = TempDir::new().unwrap();
        let out = run_cli(args(&["help"]), &HookEnv::rooted(dir.path())).unwrap();
        assert!(out.stdout.contains("check-git-hygiene"));
        assert!(out.stdout.contains("save-context"));
    }
}
