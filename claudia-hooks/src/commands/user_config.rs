//! User preferences (`claudia.json`) merged with the project's experience level.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::atomic_io;
use super::project_context;
use crate::hooks::types::HookEnv;

pub const PREFS_FILE: &str = "claudia.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Proactivity {
    Low,
    #[default]
    Moderate,
    High,
}

impl Proactivity {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => Proactivity::Low,
            "high" => Proactivity::High,
            _ => Proactivity::Moderate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Proactivity::Low => "low",
            Proactivity::Moderate => "moderate",
            Proactivity::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Experience {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Experience {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Experience::Beginner,
            "advanced" => Experience::Advanced,
            _ => Experience::Intermediate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Experience::Beginner => "beginner",
            Experience::Intermediate => "intermediate",
            Experience::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Proactivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Experience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Unknown or mistyped values fall back to the default tier.
impl<'de> Deserialize<'de> for Proactivity {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(v.as_str().map(Proactivity::parse).unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Experience {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(v.as_str().map(Experience::parse).unwrap_or_default())
    }
}

fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|i| i.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    })
}

/// The `claudia.json` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPrefs {
    #[serde(default)]
    pub proactivity: Proactivity,
    #[serde(default, deserialize_with = "string_list")]
    pub suppress_hooks: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub suppress_topics: Vec<String>,
}

/// The knobs every hook consults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserConfig {
    pub proactivity: Proactivity,
    pub experience: Experience,
    pub suppress_hooks: Vec<String>,
    pub suppress_topics: Vec<String>,
}

impl UserConfig {
    pub fn is_beginner(&self) -> bool {
        self.experience == Experience::Beginner
    }

    pub fn hook_suppressed(&self, hook: &str) -> bool {
        self.suppress_hooks.iter().any(|h| h == hook)
    }

    /// Case-insensitive match on a keyword or its category.
    pub fn topic_suppressed(&self, keyword: &str, category: &str) -> bool {
        self.suppress_topics.iter().any(|t| {
            let t = t.to_lowercase();
            t == keyword.to_lowercase() || t == category.to_lowercase()
        })
    }
}

pub fn load_user_prefs(state_dir: &Path) -> UserPrefs {
    atomic_io::read_json_or_default(&state_dir.join(PREFS_FILE))
}

/// Resolve preferences and the current project's experience level.
/// Each source is read independently; a broken file only costs its own fields.
pub fn load_user_config(env: &HookEnv) -> UserConfig {
    let prefs = load_user_prefs(&env.state_dir);
    let ctx = project_context::load_project_context(env, None);
    let experience = ctx
        .get("experience")
        .and_then(|v| v.as_str())
        .map(Experience::parse)
        .unwrap_or_default();

    UserConfig {
        proactivity: prefs.proactivity,
        experience,
        suppress_hooks: prefs.suppress_hooks,
        suppress_topics: prefs.suppress_topics,
    }
}
