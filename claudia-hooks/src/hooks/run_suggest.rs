//! Tell the user how to run a file the assistant just created, once per file
//! type per session.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::state::SessionStore;
use super::stop_dispatch::{self, StopCheck, StopResult};
use super::types::{HookEnv, HookInput, HookOutput};
use crate::commands::gating;
use crate::commands::user_config::UserConfig;

pub const STATE_NAME: &str = "runsuggest";
const PACKAGE_JSON: &str = "package.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSuggestState {
    #[serde(default)]
    pub shown_types: BTreeSet<String>,
}

fn suggestion(kind: &str, filename: &str) -> Option<String> {
    let s = match kind {
        "html" => format!("Want to see it? `open {}`", filename),
        "py" => format!("Run it: `python3 {}`", filename),
        "js" => format!("Run it: `node {}`", filename),
        "ts" => format!("Run it: `npx tsx {}`", filename),
        "sh" => format!("Run it: `bash {}`", filename),
        PACKAGE_JSON => "Install deps: `npm install`".to_string(),
        _ => return None,
    };
    Some(s)
}

const FILE_PATTERNS: &[&str] = &[
    r#"(?i)(?:I've |I have )?(?:created|wrote|written|saved|generated|made)\s+[`'"]?(\S+\.(\w+))[`'"]?"#,
    r#"(?i)(?:File|Created|Wrote|Saved)\s+[`'"]?(\S+\.(\w+))[`'"]?"#,
    r#"(?i)(?:new file|writing to|saved to)\s+[`'"]?(\S+\.(\w+))[`'"]?"#,
];

fn file_res() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| FILE_PATTERNS.iter().filter_map(|p| Regex::new(p).ok()).collect())
}

fn package_json_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(?:created|wrote|updated|modified)\s+[`'"]?package\.json[`'"]?"#).ok()
    })
    .as_ref()
}

/// First `(type, filename)` in the message with an unshown run suggestion.
fn pick(message: &str, shown: &BTreeSet<String>) -> Option<(String, String)> {
    if !shown.contains(PACKAGE_JSON) && package_json_re().is_some_and(|re| re.is_match(message)) {
        return Some((PACKAGE_JSON.to_string(), PACKAGE_JSON.to_string()));
    }
    for re in file_res() {
        for cap in re.captures_iter(message) {
            let (Some(file), Some(ext)) = (cap.get(1), cap.get(2)) else {
                continue;
            };
            let ext = ext.as_str().to_lowercase();
            if suggestion(&ext, "").is_some() && !shown.contains(&ext) {
                return Some((ext, file.as_str().to_string()));
            }
        }
    }
    None
}

pub struct RunSuggest;

impl StopCheck for RunSuggest {
    fn hook(&self) -> &'static str {
        "run-suggest"
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
        if !gating::run_suggest(cfg) {
            return Ok(None);
        }

        let store = SessionStore::new(&env.state_dir, STATE_NAME);
        let sid = input.session_id();
        let mut state: RunSuggestState = store.load(sid);
        let Some((kind, file)) = pick(message, &state.shown_types) else {
            return Ok(None);
        };
        let text = suggestion(&kind, &file).ok_or_else(|| format!("no run suggestion for {}", kind))?;
        state.shown_types.insert(kind);

        let msg = format!("Claudia: {}", text);
        Ok(Some(
            StopResult::new(msg.clone())
                .with_system_message(msg)
                .persist(store.path(sid), &state),
        ))
    }
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    stop_dispatch::handle_single(&RunSuggest, input, env)
}
