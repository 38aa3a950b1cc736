use std::sync::OnceLock;

use super::patterns::{AdvisoryChecker, Finding, MatchFlags, Rule, Ruleset};
use super::types::{HookEnv, HookInput, HookName, HookOutput, WriteEvent};
use super::{patterns, utils};

/// Full writes shorter than this are too small to judge build structure.
const MULTISTAGE_MIN_CHARS: usize = 200;

const RULES: &[Rule] = &[
    Rule {
        id: "docker_root",
        pattern: r"^\s*USER\s+root\s*$",
        suppress: None,
        description: "Running as root user",
        advice: "Add a non-root user: `RUN adduser --disabled-password appuser` then `USER appuser`. Running as root is a security risk.",
    },
    Rule {
        id: "docker_large_base",
        pattern: r"FROM\s+(?:ubuntu|debian|centos|fedora|amazonlinux)(?:\s|:)",
        suppress: None,
        description: "Large base image",
        advice: "Use Alpine or distroless images for smaller, more secure containers. `node:22-alpine` instead of `node:22`.",
    },
    Rule {
        id: "docker_latest",
        pattern: r"FROM\s+\S+:latest",
        suppress: None,
        description: "Using :latest tag",
        advice: "Pin to a specific version (e.g., `node:22-alpine`) for reproducible builds. `:latest` can change unexpectedly.",
    },
    Rule {
        id: "docker_apt_recommends",
        pattern: r"RUN\s+apt-get\s+install(?!.*--no-install-recommends)",
        suppress: None,
        description: "apt-get install without --no-install-recommends",
        advice: "Add `--no-install-recommends` to avoid pulling unnecessary packages. Keeps image smaller.",
    },
    Rule {
        id: "docker_apt_separate",
        pattern: r"RUN\s+apt-get\s+update\s*\n\s*RUN\s+apt-get\s+install",
        suppress: None,
        description: "Separate RUN for apt-get update and install",
        advice: "Combine into one RUN: `RUN apt-get update && apt-get install -y ...`. Separate RUNs can use stale package lists from cache.",
    },
    Rule {
        id: "docker_copy_all",
        pattern: r"COPY\s+\.\s",
        suppress: None,
        description: "COPY . (copying entire context)",
        advice: "Copy only what's needed, or use a `.dockerignore` file. `COPY . .` includes node_modules, .git, .env, and other files you don't want.",
    },
    Rule {
        id: "docker_npm_dev",
        pattern: r"RUN\s+npm\s+install\b(?!.*--production)(?!.*--omit)",
        suppress: None,
        description: "npm install without --production/--omit=dev",
        advice: "Use `npm ci --omit=dev` in production Dockerfiles to exclude devDependencies and use exact lockfile versions.",
    },
    Rule {
        id: "docker_env_secret",
        pattern: r"ENV\s+\S+\s*=\s*(?:sk[_-]|AKIA|ghp_|password|secret)",
        suppress: None,
        description: "Secret in ENV instruction",
        advice: "Never put secrets in Dockerfiles (they persist in image layers). Use build args with --secret, or runtime environment variables.",
    },
    Rule {
        id: "docker_ssh",
        pattern: r"EXPOSE\s+22\b",
        suppress: None,
        description: "Exposing SSH port",
        advice: "Don't run SSH in containers. Use `docker exec` or orchestrator tools for debugging.",
    },
    Rule {
        id: "docker_chmod_777",
        pattern: r"RUN\s+chmod\s+777",
        suppress: None,
        description: "chmod 777 in Dockerfile",
        advice: "Use minimal permissions (755 for dirs, 644 for files). 777 is a security risk.",
    },
];

/// Absence rule: fires when a long full write has no named stage.
const MULTISTAGE: Rule = Rule {
    id: "docker_no_multistage",
    pattern: r"FROM\s+\S+.*\bAS\b",
    suppress: None,
    description: "No multi-stage build detected",
    advice: "Consider multi-stage builds to separate build dependencies from the runtime image. Dramatically reduces image size.",
};

fn ruleset() -> &'static Ruleset {
    static SET: OnceLock<Ruleset> = OnceLock::new();
    SET.get_or_init(|| {
        Ruleset::compile(
            RULES,
            MatchFlags {
                case_insensitive: true,
                multi_line: true,
                ..MatchFlags::default()
            },
        )
    })
}

fn multistage() -> &'static Ruleset {
    static SET: OnceLock<Ruleset> = OnceLock::new();
    SET.get_or_init(|| Ruleset::compile(&[MULTISTAGE], MatchFlags::IGNORE_CASE))
}

pub fn is_dockerfile(file_path: &str) -> bool {
    let base = utils::basename(file_path);
    base == "Dockerfile" || base.starts_with("Dockerfile.") || base.ends_with(".dockerfile")
}

/// Dockerfile anti-patterns.
pub struct DockerfileChecker;

impl AdvisoryChecker for DockerfileChecker {
    fn hook(&self) -> HookName {
        HookName::CheckDockerfile
    }

    fn state_name(&self) -> &'static str {
        "dockerfile"
    }

    fn is_relevant(&self, event: &WriteEvent) -> bool {
        is_dockerfile(&event.file_path)
    }

    fn findings(&self, event: &WriteEvent) -> Vec<Finding> {
        let mut found = ruleset().check(&event.content);
        // Partial edits cannot tell whether the file has other stages.
        if event.is_full_write()
            && event.content.chars().count() > MULTISTAGE_MIN_CHARS
            && !multistage().any_match(&event.content)
        {
            found.push(Finding::from_rule(&MULTISTAGE));
        }
        found
    }

    fn heading(&self, _event: &WriteEvent) -> String {
        "Claudia noticed some Dockerfile patterns worth reviewing:".to_string()
    }
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    patterns::handle_advisory(&DockerfileChecker, input, env)
}
