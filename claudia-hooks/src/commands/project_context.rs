//! Project identity and project-scoped context documents.
//!
//! A project is the nearest ancestor of the working directory holding a `.git`
//! directory (or the working directory itself), identified by the first eight
//! hex digits of the md5 of its path. Context lives in
//! `claudia-projects/<key>.json`, with `claudia-context.json` as the global
//! fallback and `claudia-projects.json` as the registry of every known project.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::atomic_io;
use crate::hooks::types::HookEnv;

pub const GLOBAL_CONTEXT_FILE: &str = "claudia-context.json";
pub const REGISTRY_FILE: &str = "claudia-projects.json";
pub const PROJECTS_DIR: &str = "claudia-projects";

/// A context document: open-ended JSON object.
pub type Context = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectId {
    pub key: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub last_active: String,
    #[serde(default)]
    pub created: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default = "registry_version")]
    pub version: u32,
    pub projects: BTreeMap<String, RegistryEntry>,
}

fn registry_version() -> u32 {
    1
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            version: registry_version(),
            projects: BTreeMap::new(),
        }
    }
}

/// Eight hex digits of md5(path); stable across runs and installs.
pub fn project_key(path: &Path) -> String {
    let digest = format!("{:x}", md5::compute(path.to_string_lossy().as_bytes()));
    digest[..8].to_string()
}

fn same_dir(a: &Path, b: &Path) -> bool {
    let canon = |p: &Path| fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
    canon(a) == canon(b)
}

/// Map a working directory to its project.
///
/// Home itself is never a project. The upward walk stops at the filesystem
/// root and never steps onto `home`; without a `.git` marker the working
/// directory becomes the project root.
pub fn resolve_project(cwd: &Path, home: &Path) -> Option<ProjectId> {
    if same_dir(cwd, home) {
        return None;
    }

    let mut current = cwd.to_path_buf();
    loop {
        if current.join(".git").is_dir() {
            return Some(ProjectId {
                key: project_key(&current),
                path: current,
            });
        }
        let Some(parent) = current.parent() else {
            break;
        };
        if parent.as_os_str().is_empty() || same_dir(parent, home) {
            break;
        }
        current = parent.to_path_buf();
    }

    Some(ProjectId {
        key: project_key(cwd),
        path: cwd.to_path_buf(),
    })
}

pub fn project_file(state_dir: &Path, key: &str) -> PathBuf {
    state_dir.join(PROJECTS_DIR).join(format!("{}.json", key))
}

fn read_context(path: &Path) -> Option<Context> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<Value>(&raw).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Project document for `key` (resolved from the working directory when
/// `None`), else the global document, else empty.
pub fn load_project_context(env: &HookEnv, key: Option<&str>) -> Context {
    let resolved;
    let key = match key {
        Some(k) => Some(k),
        None => {
            resolved = resolve_project(&env.cwd, &env.home);
            resolved.as_ref().map(|p| p.key.as_str())
        }
    };

    if let Some(key) = key.filter(|k| !k.is_empty())
        && let Some(ctx) = read_context(&project_file(&env.state_dir, key))
    {
        return ctx;
    }

    read_context(&env.state_dir.join(GLOBAL_CONTEXT_FILE)).unwrap_or_default()
}

/// Merge `data` into the project document and refresh the registry.
/// With no resolvable project the global document takes the merge.
/// Writes are best-effort.
pub fn save_project_context(
    env: &HookEnv,
    data: &Context,
    key: Option<&str>,
    path: Option<&Path>,
) {
    let resolved = if key.is_none() || path.is_none() {
        resolve_project(&env.cwd, &env.home)
    } else {
        None
    };
    let key = key
        .map(str::to_string)
        .or_else(|| resolved.as_ref().map(|p| p.key.clone()))
        .filter(|k| !k.is_empty());
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| resolved.as_ref().map(|p| p.path.clone()));

    let Some(key) = key else {
        let global = env.state_dir.join(GLOBAL_CONTEXT_FILE);
        let mut existing = read_context(&global).unwrap_or_default();
        merge(&mut existing, data);
        let _ = atomic_io::write_json(&global, &existing);
        return;
    };

    let file = project_file(&env.state_dir, &key);
    let mut existing = read_context(&file).unwrap_or_default();
    merge(&mut existing, data);
    existing.insert("project_key".to_string(), Value::String(key.clone()));
    let path_str = path.as_ref().map(|p| p.to_string_lossy().to_string());
    if let Some(ref p) = path_str {
        existing.insert("path".to_string(), Value::String(p.clone()));
        if !existing.contains_key("name") {
            existing.insert("name".to_string(), Value::String(path_basename(p)));
        }
    }
    let _ = atomic_io::write_json(&file, &existing);

    let name = existing
        .get("name")
        .and_then(|n| n.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| path_str.as_deref().map(path_basename).unwrap_or_default());
    update_registry(&env.state_dir, &key, &name, path_str.as_deref());
}

fn merge(into: &mut Context, data: &Context) {
    for (k, v) in data {
        into.insert(k.clone(), v.clone());
    }
}

fn path_basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub fn load_registry(state_dir: &Path) -> Registry {
    atomic_io::read_json_or_default(&state_dir.join(REGISTRY_FILE))
}

fn update_registry(state_dir: &Path, key: &str, name: &str, path: Option<&str>) {
    let mut registry = load_registry(state_dir);
    let now = Utc::now().to_rfc3339();

    match registry.projects.get_mut(key) {
        Some(entry) => {
            entry.last_active = now;
            if !name.is_empty() {
                entry.name = name.to_string();
            }
            if let Some(p) = path.filter(|p| !p.is_empty()) {
                entry.path = p.to_string();
            }
        }
        None => {
            registry.projects.insert(
                key.to_string(),
                RegistryEntry {
                    name: name.to_string(),
                    path: path.unwrap_or_default().to_string(),
                    last_active: now.clone(),
                    created: now,
                    extra: Map::new(),
                },
            );
        }
    }

    let _ = atomic_io::write_json(&state_dir.join(REGISTRY_FILE), &registry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn obj(v: Value) -> Context {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    fn env_at(home: &Path, cwd: &Path) -> HookEnv {
        HookEnv {
            state_dir: home.join(".claude"),
            home: home.to_path_buf(),
            cwd: cwd.to_path_buf(),
        }
    }

    #[test]
    fn test_project_key_is_md5_prefix() {
        let a = project_key(Path::new("/tmp/proj"));
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, project_key(Path::new("/tmp/proj")));
        assert_ne!(a, project_key(Path::new("/tmp/other")));
        assert_eq!(
            project_key(Path::new("")),
            "d41d8cd9",
            "md5 of the empty string"
        );
    }

    #[test]
    fn test_home_is_never_a_project() {
        let home = TempDir::new().unwrap();
        fs::create_dir_all(home.path().join(".git")).unwrap();
        assert_eq!(resolve_project(home.path(), home.path()), None);
    }

    #[test]
    fn test_nested_dirs_share_repo_key() {
        let home = TempDir::new().unwrap();
        let repo = home.path().join("code").join("app");
        let deep = repo.join("src").join("components").join("ui");
        fs::create_dir_all(repo.join(".git")).unwrap();
        fs::create_dir_all(&deep).unwrap();

        let at_root = resolve_project(&repo, home.path()).unwrap();
        let nested = resolve_project(&deep, home.path()).unwrap();
        assert_eq!(at_root, nested);
        assert_eq!(at_root.path, repo);
        assert_eq!(at_root.key, project_key(&repo));
    }

    #[test]
    fn test_no_git_falls_back_to_cwd() {
        let home = TempDir::new().unwrap();
        let dir = home.path().join("scratch").join("idea");
        fs::create_dir_all(&dir).unwrap();
        // a .git in home must not be picked up from below
        fs::create_dir_all(home.path().join(".git")).unwrap();

        let p = resolve_project(&dir, home.path()).unwrap();
        assert_eq!(p.path, dir);
        assert_eq!(p.key, project_key(&dir));
    }

    #[test]
    fn test_load_falls_back_to_global_then_empty() {
        let home = TempDir::new().unwrap();
        let env = env_at(home.path(), home.path());
        assert!(load_project_context(&env, Some("deadbeef")).is_empty());

        fs::create_dir_all(&env.state_dir).unwrap();
        fs::write(
            env.state_dir.join(GLOBAL_CONTEXT_FILE),
            r#"{"experience": "beginner"}"#,
        )
        .unwrap();
        let ctx = load_project_context(&env, Some("deadbeef"));
        assert_eq!(ctx["experience"], "beginner");
    }

    #[test]
    fn test_corrupt_project_file_falls_back() {
        let home = TempDir::new().unwrap();
        let env = env_at(home.path(), home.path());
        let file = project_file(&env.state_dir, "abcd1234");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "{oops").unwrap();
        fs::write(env.state_dir.join(GLOBAL_CONTEXT_FILE), r#"{"stack": ["go"]}"#).unwrap();
        assert_eq!(load_project_context(&env, Some("abcd1234"))["stack"], json!(["go"]));
    }

    #[test]
    fn test_save_at_home_writes_global() {
        let home = TempDir::new().unwrap();
        let env = env_at(home.path(), home.path());
        save_project_context(&env, &obj(json!({"experience": "advanced"})), None, None);
        save_project_context(&env, &obj(json!({"stack": ["rust"]})), None, None);

        let ctx = read_context(&env.state_dir.join(GLOBAL_CONTEXT_FILE)).unwrap();
        assert_eq!(ctx["experience"], "advanced");
        assert_eq!(ctx["stack"], json!(["rust"]));
        assert!(load_registry(&env.state_dir).projects.is_empty());
    }

    #[test]
    fn test_save_project_stamps_and_registers() {
        let home = TempDir::new().unwrap();
        let repo = home.path().join("shop");
        fs::create_dir_all(repo.join(".git")).unwrap();
        let env = env_at(home.path(), &repo);

        save_project_context(&env, &obj(json!({"stack": ["react"]})), None, None);
        let key = project_key(&repo);

        let ctx = load_project_context(&env, None);
        assert_eq!(ctx["project_key"], key.as_str());
        assert_eq!(ctx["path"], repo.to_string_lossy().as_ref());
        assert_eq!(ctx["name"], "shop");
        assert_eq!(ctx["stack"], json!(["react"]));

        let registry = load_registry(&env.state_dir);
        assert_eq!(registry.version, 1);
        let entry = &registry.projects[&key];
        assert_eq!(entry.name, "shop");
        assert_eq!(entry.created, entry.last_active);
    }

    #[test]
    fn test_second_save_merges_and_bumps_last_active() {
        let home = TempDir::new().unwrap();
        let repo = home.path().join("shop");
        fs::create_dir_all(repo.join(".git")).unwrap();
        let env = env_at(home.path(), &repo);
        let key = project_key(&repo);

        save_project_context(&env, &obj(json!({"stack": ["react"]})), None, None);
        let created = load_registry(&env.state_dir).projects[&key].created.clone();
        std::thread::sleep(std::time::Duration::from_millis(5));
        save_project_context(
            &env,
            &obj(json!({"name": "Shop Front", "decisions": ["use vite"]})),
            None,
            None,
        );

        let ctx = load_project_context(&env, None);
        assert_eq!(ctx["stack"], json!(["react"]));
        assert_eq!(ctx["decisions"], json!(["use vite"]));
        assert_eq!(ctx["name"], "Shop Front");

        let entry = &load_registry(&env.state_dir).projects[&key];
        assert_eq!(entry.created, created);
        assert_ne!(entry.last_active, created);
        assert_eq!(entry.name, "Shop Front");
    }

    #[test]
    fn test_registry_without_projects_is_default() {
        let home = TempDir::new().unwrap();
        let state = home.path().join(".claude");
        fs::create_dir_all(&state).unwrap();
        fs::write(state.join(REGISTRY_FILE), r#"{"version": 1}"#).unwrap();
        assert_eq!(load_registry(&state), Registry::default());
    }
}
