//! PreCompact: teach beginners what compaction is and how to trigger it.

use serde::{Deserialize, Serialize};

use super::state::SessionStore;
use super::types::{HookEnv, HookInput, HookOutput};
use crate::commands::gating;
use crate::commands::user_config::{self, UserConfig};

pub const STATE_NAME: &str = "compact";

const AUTO_TIP: &str = "\u{1f4a1} Claudia: Your context just got compacted automatically. \
    Pro tip: you can do this yourself anytime by pressing Esc twice quickly. \
    It helps Claude stay focused on what matters.";
const MANUAL_TIP: &str = "\u{1f4a1} Claudia: Nice, you're managing your context like a pro.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactState {
    #[serde(default)]
    pub shown_esc_tip: bool,
    #[serde(default)]
    pub shown_manual_tip: bool,
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    let cfg = user_config::load_user_config(env);
    handle_with(input, env, &cfg)
}

fn handle_with(input: &HookInput, env: &HookEnv, cfg: &UserConfig) -> Result<HookOutput, String> {
    if !gating::compact_tip(cfg) {
        return Ok(HookOutput::empty());
    }

    let store = SessionStore::new(&env.state_dir, STATE_NAME);
    let sid = input.session_id();
    let mut state: CompactState = store.load(sid);

    let tip = match input.str_field("trigger") {
        Some("auto") if !state.shown_esc_tip => {
            state.shown_esc_tip = true;
            AUTO_TIP
        }
        Some("manual") if !state.shown_manual_tip => {
            state.shown_manual_tip = true;
            MANUAL_TIP
        }
        _ => return Ok(HookOutput::empty()),
    };

    store.save(sid, &state);
    Ok(HookOutput::advisory(Some(tip.to_string()), Some(tip.to_string())))
}
