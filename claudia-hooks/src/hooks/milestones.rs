//! Celebrate a beginner's firsts: first file, first fix, first commit,
//! first run, ten files. Achievements are global and never repeat.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::stop_dispatch::{self, StopCheck, StopResult};
use super::types::{HookEnv, HookInput, HookOutput};
use super::utils::{self, COLOR_WARN};
use crate::commands::atomic_io;
use crate::commands::gating;
use crate::commands::user_config::UserConfig;

pub const MILESTONES_FILE: &str = "claudia-milestones.json";
pub const TEN_FILES: &str = "ten_files";
const TEN_FILES_THRESHOLD: u64 = 10;

/// Cross-session progress document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneState {
    #[serde(default)]
    pub achieved: BTreeSet<String>,
    #[serde(default)]
    pub file_count: u64,
}

struct Milestone {
    id: &'static str,
    patterns: &'static [&'static str],
    message: &'static str,
}

const MILESTONES: &[Milestone] = &[
    Milestone {
        id: "first_file",
        patterns: &[
            r#"(?:I've |I have )?(?:created|wrote|written|saved|generated)\s+[`'"]?\S+\.\w+"#,
            r#"(?:new file|writing to|saved to)\s+[`'"]?\S+\.\w+"#,
        ],
        message: "You just created your first file. That's real code in the real world.",
    },
    Milestone {
        id: "first_error_fixed",
        patterns: &[
            r"(?:I've |I have )?(?:fixed|resolved|corrected|patched)\s+(?:the |this |that )?(?:error|bug|issue|problem)",
            r"(?:error|bug|issue) (?:is |has been )?(?:fixed|resolved|corrected)",
            r"should (?:work|be fixed) now",
        ],
        message: "First bug squashed. Welcome to the club.",
    },
    Milestone {
        id: "first_commit",
        patterns: &[
            r"(?:I've |I have )?(?:committed|created a commit|made a commit)",
            r"git commit",
            r"committed (?:the |your )?changes",
        ],
        message: "First commit. Your code has a save point now.",
    },
    Milestone {
        id: "first_project_run",
        patterns: &[
            r"(?:server|app|application|project) (?:is )?running",
            r"(?:running|started) (?:on|at) (?:http|localhost|port)",
            r"npm (?:run )?(?:dev|start)",
            r"python3?\s+\S+\.py",
            r"node\s+\S+\.js",
        ],
        message: "Your project is running. You built something that works.",
    },
];

const TEN_FILES_MESSAGE: &str = "10+ files. This isn't a toy -- it's a real project.";

fn compiled() -> &'static Vec<(&'static Milestone, Vec<Regex>)> {
    static RE: OnceLock<Vec<(&'static Milestone, Vec<Regex>)>> = OnceLock::new();
    RE.get_or_init(|| {
        MILESTONES
            .iter()
            .map(|m| {
                let res = m
                    .patterns
                    .iter()
                    .filter_map(|p| Regex::new(&format!("(?i){}", p)).ok())
                    .collect();
                (m, res)
            })
            .collect()
    })
}

const FILE_MENTIONS: &[&str] = &[
    r#"(?i)(?:created|wrote|written|saved|generated)\s+[`'"]?(\S+\.\w+)"#,
    r#"(?i)(?:new file|writing to|saved to)\s+[`'"]?(\S+\.\w+)"#,
];

fn file_mention_res() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| FILE_MENTIONS.iter().filter_map(|p| Regex::new(p).ok()).collect())
}

/// Distinct file names the message claims to have written.
pub fn count_new_files(message: &str) -> u64 {
    let mut files = BTreeSet::new();
    for re in file_mention_res() {
        for cap in re.captures_iter(message) {
            if let Some(m) = cap.get(1) {
                files.insert(m.as_str());
            }
        }
    }
    files.len() as u64
}

pub fn state_path(state_dir: &Path) -> PathBuf {
    state_dir.join(MILESTONES_FILE)
}

pub fn load_state(state_dir: &Path) -> MilestoneState {
    atomic_io::read_json_or_default(&state_path(state_dir))
}

/// Pick at most one milestone for this message. Ten files is checked first.
fn next_milestone(message: &str, state: &MilestoneState) -> Option<(&'static str, &'static str)> {
    if !state.achieved.contains(TEN_FILES) && state.file_count >= TEN_FILES_THRESHOLD {
        return Some((TEN_FILES, TEN_FILES_MESSAGE));
    }
    compiled()
        .iter()
        .filter(|(m, _)| !state.achieved.contains(m.id))
        .find(|(_, res)| res.iter().any(|re| re.is_match(message)))
        .map(|(m, _)| (m.id, m.message))
}

pub struct Milestones;

impl StopCheck for Milestones {
    fn hook(&self) -> &'static str {
        "milestones"
    }

    fn evaluate(
        &self,
        input: &HookInput,
        cfg: &UserConfig,
        env: &HookEnv,
    ) -> Result<Option<StopResult>, String> {
        let Some(message) = stop_dispatch::assistant_message(input) else {
            return Ok(None);
        };
        if !gating::beginner_coaching(cfg) {
            return Ok(None);
        }

        let mut state = load_state(&env.state_dir);
        let new_files = count_new_files(message);
        state.file_count += new_files;
        // The tally is saved whether or not this turn's celebration is shown.
        if new_files > 0 {
            let _ = atomic_io::write_json(&state_path(&env.state_dir), &state);
        }

        let Some((id, celebration)) = next_milestone(message, &state) else {
            return Ok(None);
        };
        state.achieved.insert(id.to_string());

        let msg = format!("Claudia: {}", celebration);
        let (user_hint, assistant_hint) = utils::dismiss_hint(self.hook());
        Ok(Some(
            StopResult::new(format!("{}\n{}", msg, assistant_hint))
                .with_system_message(utils::colorize(COLOR_WARN, &format!("{}\n{}", msg, user_hint)))
                .persist(state_path(&env.state_dir), &state),
        ))
    }
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    stop_dispatch::handle_single(&Milestones, input, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::user_config::{Experience, Proactivity};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn cfg(p: Proactivity, e: Experience) -> UserConfig {
        UserConfig {
            proactivity: p,
            experience: e,
            ..Default::default()
        }
    }

    fn said(msg: &str) -> HookInput {
        HookInput::new(json!({"session_id": "s1", "last_assistant_message": msg}))
    }

    fn eval(msg: &str, env: &HookEnv) -> Option<StopResult> {
        Milestones
            .evaluate(&said(msg), &cfg(Proactivity::Moderate, Experience::Beginner), env)
            .unwrap()
    }

    #[test]
    fn test_first_file_celebrated_once() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());

        let result = eval("I've created `index.html` for you.", &env).unwrap();
        assert!(result.additional_context.starts_with("Claudia: You just created your first file."));
        assert!(result.additional_context.contains("suppress_hooks"));
        let sys = result.system_message.clone().unwrap();
        assert!(sys.starts_with("\x1b[38;5;160m"));
        assert!(sys.contains("silence milestones"));

        result.commit();
        let state = load_state(&env.state_dir);
        assert!(state.achieved.contains("first_file"));
        assert_eq!(state.file_count, 1);

        assert!(eval("I wrote about.html too", &env).is_none());
    }

    #[test]
    fn test_uncommitted_result_does_not_mark_achieved() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        assert!(eval("The bug is fixed.", &env).is_some());
        assert!(load_state(&env.state_dir).achieved.is_empty());
    }

    #[test]
    fn test_ten_files_takes_priority() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let state = MilestoneState {
            achieved: ["first_file".to_string()].into_iter().collect(),
            file_count: 9,
        };
        atomic_io::write_json(&state_path(&env.state_dir), &state).unwrap();

        let result = eval("Saved to util.py and ran git commit", &env).unwrap();
        assert!(result.additional_context.contains("10+ files"));
    }

    #[test]
    fn test_file_count_tracked_without_celebration() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let state = MilestoneState {
            achieved: ["first_file".to_string()].into_iter().collect(),
            file_count: 0,
        };
        atomic_io::write_json(&state_path(&env.state_dir), &state).unwrap();

        assert!(eval("created a.js and generated b.css", &env).is_none());
        assert_eq!(load_state(&env.state_dir).file_count, 2);
    }

    #[test]
    fn test_file_count_kept_when_turn_lock_is_taken() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        assert!(crate::hooks::stop_lock::try_acquire(&env.state_dir, "s1"));

        let out = stop_dispatch::run_checks(
            &[&Milestones],
            &said("I've created `a.py` for you."),
            &cfg(Proactivity::Moderate, Experience::Beginner),
            &env,
        );
        assert!(out.stdout.is_empty());
        let state = load_state(&env.state_dir);
        assert_eq!(state.file_count, 1);
        assert!(state.achieved.is_empty());
    }

    #[test]
    fn test_gated_for_non_beginners_and_low() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let msg = said("I've created app.py");
        for c in [
            cfg(Proactivity::High, Experience::Intermediate),
            cfg(Proactivity::Low, Experience::Beginner),
        ] {
            assert!(Milestones.evaluate(&msg, &c, &env).unwrap().is_none());
        }
    }

    #[test]
    fn test_corrupt_state_reads_as_fresh() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        fs::create_dir_all(&env.state_dir).unwrap();
        fs::write(state_path(&env.state_dir), "][").unwrap();
        assert!(eval("npm run dev is up", &env).unwrap().additional_context.contains("running"));
    }

    #[test]
    fn test_count_new_files_distinct() {
        assert_eq!(count_new_files("created a.py, then wrote a.py and saved to b.rs"), 2);
        assert_eq!(count_new_files("nothing here"), 0);
    }

    #[test]
    fn test_file_mention_patterns_all_compile() {
        assert_eq!(file_mention_res().len(), FILE_MENTIONS.len());
    }
}
