//! After the assistant finishes something, offer a beginner three concrete
//! things to try next. At most three times per session.

use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

use super::state::SessionStore;
use super::stop_dispatch::{self, StopCheck, StopResult};
use super::types::{HookEnv, HookInput, HookOutput};
use crate::commands::gating;
use crate::commands::user_config::UserConfig;

pub const STATE_NAME: &str = "nextsteps";
pub const MAX_PER_SESSION: u32 = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextStepsState {
    #[serde(default)]
    pub count: u32,
}

const COMPLETION_SIGNALS: &[&str] = &[
    r"I've created",
    r"I have created",
    r"I've written",
    r"I've built",
    r"I've set up",
    r"I've added",
    r"I've updated",
    r"I've fixed",
    r"I've implemented",
    r"Done[.!]",
    r"Here's your",
    r"Here is your",
    r"All set[.!]",
    r"That's done",
    r"It's ready",
    r"The [\w\s]+ is ready",
    r"Your [\w\s]+ is ready",
];

const DEV_SERVER_STEPS: &[&str] = &[
    "Start the dev server: `npm run dev` or `npm start`",
    "Ask me to add more components",
    "Check it in your browser at localhost",
];

const DEFAULT_STEPS: &[&str] = &[
    "Ask me to explain what I built: `/claudia:explain`",
    "Ask me to review it for issues: `/claudia:review`",
    "Tell me what you want to add or change next",
];

fn steps_for(ext: &str) -> Option<&'static [&'static str]> {
    let steps: &'static [&'static str] = match ext {
        "html" => &[
            "Open it in your browser to see it: `open {filename}`",
            "Try changing some text in the file and refreshing",
            "Ask me to add CSS styling: 'make it look better'",
        ],
        "css" => &[
            "Refresh your browser to see the changes",
            "Ask me to add more styles: 'add a dark mode'",
        ],
        "py" => &[
            "Run it: `python3 {filename}`",
            "Ask me to add error handling or tests",
            "Try changing the inputs and running again",
        ],
        "js" => &[
            "Run it: `node {filename}`",
            "Ask me to explain how it works: `/claudia:explain {filename}`",
            "Try modifying it and see what happens",
        ],
        "jsx" | "tsx" => DEV_SERVER_STEPS,
        "json" => &[
            "Run `npm install` to install dependencies",
            "Check the scripts with `npm run`",
        ],
        _ => return None,
    };
    Some(steps)
}

fn completion_set() -> Option<&'static RegexSet> {
    static RE: OnceLock<Option<RegexSet>> = OnceLock::new();
    RE.get_or_init(|| {
        RegexSet::new(COMPLETION_SIGNALS.iter().map(|p| format!("(?i){}", p))).ok()
    })
    .as_ref()
}

fn filename_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[`'"]?(\S+\.(\w{1,4}))[`'"]?"#).ok())
        .as_ref()
}

pub fn is_completion(message: &str) -> bool {
    completion_set().is_some_and(|set| set.is_match(message))
}

/// Up to three steps, keyed off the first mentioned file with a known type.
pub fn suggested_steps(message: &str) -> Vec<String> {
    let hit = filename_re().and_then(|re| {
        re.captures_iter(message).find_map(|cap| {
            let file = cap.get(1)?.as_str();
            let ext = cap.get(2)?.as_str().to_lowercase();
            steps_for(&ext).map(|steps| (file, steps))
        })
    });

    match hit {
        Some((file, steps)) => steps
            .iter()
            .take(3)
            .map(|s| s.replace("{filename}", file))
            .collect(),
        None => DEFAULT_STEPS
            .iter()
            .take(3)
            .map(|s| s.replace(" {filename}", "").replace("{filename}", "the file"))
            .collect(),
    }
}

pub struct NextSteps;

impl StopCheck for NextSteps {
    fn hook(&self) -> &'static str {
        "next-steps"
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

        let store = SessionStore::new(&env.state_dir, STATE_NAME);
        let sid = input.session_id();
        let mut state: NextStepsState = store.load(sid);
        if state.count >= MAX_PER_SESSION || !is_completion(message) {
            return Ok(None);
        }
        state.count += 1;

        let lines: Vec<String> = suggested_steps(message)
            .iter()
            .map(|s| format!("  - {}", s))
            .collect();
        let text = format!("Claudia: What's next? Here are some ideas:\n{}", lines.join("\n"));
        Ok(Some(StopResult::new(text).persist(store.path(sid), &state)))
    }
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    stop_dispatch::handle_single(&NextSteps, input, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::user_config::{Experience, Proactivity};
    use serde_json::json;
    use tempfile::TempDir;

    fn beginner() -> UserConfig {
        UserConfig {
            proactivity: Proactivity::Moderate,
            experience: Experience::Beginner,
            ..Default::default()
        }
    }

    fn said(msg: &str) -> HookInput {
        HookInput::new(json!({"session_id": "s1", "last_assistant_message": msg}))
    }

    #[test]
    fn test_steps_follow_file_type() {
        let steps = suggested_steps("I've created `index.html` with a heading.");
        assert_eq!(steps[0], "Open it in your browser to see it: `open index.html`");
        assert_eq!(steps.len(), 3);

        let css = suggested_steps("Done! Updated styles.css");
        assert_eq!(css.len(), 2);

        let fallback = suggested_steps("All set!");
        assert_eq!(fallback[1], "Ask me to review it for issues: `/claudia:review`");
    }

    #[test]
    fn test_needs_completion_signal() {
        assert!(is_completion("Your landing page is ready"));
        assert!(is_completion("done!"));
        assert!(!is_completion("Let me think about app.py"));
    }

    #[test]
    fn test_capped_per_session() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        for _ in 0..MAX_PER_SESSION {
            let r = NextSteps.evaluate(&said("Done. I've built app.py"), &beginner(), &env).unwrap().unwrap();
            assert!(r.additional_context.starts_with("Claudia: What's next?"));
            assert!(r.system_message.is_none());
            r.commit();
        }
        assert!(NextSteps.evaluate(&said("Done."), &beginner(), &env).unwrap().is_none());
    }

    #[test]
    fn test_non_beginner_gated() {
        let dir = TempDir::new().unwrap();
        let env = HookEnv::rooted(dir.path());
        let cfg = UserConfig {
            proactivity: Proactivity::High,
            ..Default::default()
        };
        assert!(NextSteps.evaluate(&said("Done."), &cfg, &env).unwrap().is_none());
    }

    #[test]
    fn test_signal_patterns_compile() {
        assert!(completion_set().is_some_and(|set| set.len() == COMPLETION_SIGNALS.len()));
        assert!(filename_re().is_some());
    }
}
