//! SessionStart: greeting on startup, a beginner tip, and context recovery
//! after compaction or resume.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::milestones;
use super::state::SessionStore;
use super::types::{HookEnv, HookInput, HookOutput};
use super::utils::{self, COLOR_NOTICE};
use crate::commands::gating;
use crate::commands::git_state;
use crate::commands::project_context;
use crate::commands::user_config::{self, UserConfig};

pub const STATE_NAME: &str = "session";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub shown_greeting: bool,
    #[serde(default)]
    pub shown_startup_tip: bool,
    #[serde(default)]
    pub shown_compact_tip: bool,
    #[serde(default)]
    pub shown_resume_tip: bool,
    #[serde(default)]
    pub shown_tips_history: Vec<String>,
}

pub const STARTUP_TIPS: &[&str] = &[
    "Shift+Tab switches between ask mode and command mode. Ask mode is for questions, command mode is for actions.",
    "Type / to see available commands. Try /claudia:ask to ask me anything about your tech stack.",
    "Claudia watches your code for common mistakes, like a spell checker for security and best practices.",
    "You can press Esc twice quickly to compact your context. This helps Claude stay focused on longer sessions.",
    "If Claude's response gets cut off, just type 'continue' and it'll pick up where it left off.",
    "You can select text in your editor and ask Claude about just that selection.",
    "Use /claudia:explain to have me break down any code or concept in plain language.",
    "If you're not sure what to ask, try describing what you want to build. Claude works best with goals, not instructions.",
    "Claude can read your project files. You don't need to paste code, just reference the file name.",
    "When you get an error you don't understand, paste it here. That's literally what I'm for.",
    "Ctrl+A then Ctrl+K clears your whole input line. Faster than holding backspace.",
    "Up arrow recalls your last prompt. Edit and resend instead of retyping the whole thing.",
];

const COMPACT_TIP: &str = "Context was just compacted. Claude can still see your files, it just forgot the \
    conversation details. If you need to re-explain something, that's normal.";

const GREETING_PREAMBLE: &str = "IMPORTANT: Claudia plugin is loaded. On this very first response, \
    before answering the user, display this exact greeting block:\n\n";
const GREETING_CLOSING: &str =
    "\n\nDisplay this greeting exactly as shown, then answer whatever the user asked.";

const BEGINNER_BANNER: &str = "```
         ◉ ◉
        ╭┤ ├╮
╭───────┤   ├─────────────────────────╮
│                                     │
│  Claudia is here.                   │
│  Just build. I'm watching.          │
│                                     │
╰─────────────────────────────────────╯
```";

const FULL_BANNER: &str = "```
         ◉ ◉
        ╭┤ ├╮
╭───────┤   ├─────────────────────────╮
│                                     │
│  Claudia is here.                   │
│  She catches what you miss.         │
│                                     │
│  /claudia:ask    — ask me anything  │
│  /claudia:explain — explain code    │
│  /claudia:review — review changes   │
│  /claudia:setup  — first-time setup │
│                                     │
│  Or just build. I'm watching.       │
│                                     │
╰─────────────────────────────────────╯
```";

const BEGINNER_GREETING_LINE: &str = "Claudia is here. Just build. She's watching.";
const FULL_GREETING_LINE: &str =
    "Claudia is here. She catches what you miss. Try /claudia:ask, /claudia:explain, /claudia:review";

fn greeting(beginner: bool) -> String {
    let banner = if beginner { BEGINNER_BANNER } else { FULL_BANNER };
    format!("{}{}{}", GREETING_PREAMBLE, banner, GREETING_CLOSING)
}

/// Choose a startup tip not yet in `history`; the pool refills once every
/// tip has been shown.
pub fn pick_startup_tip<R: Rng + ?Sized>(rng: &mut R, history: &[String]) -> &'static str {
    let fresh: Vec<&'static str> = STARTUP_TIPS
        .iter()
        .copied()
        .filter(|t| !history.iter().any(|h| h == t))
        .collect();
    let pool: &[&'static str] = if fresh.is_empty() { STARTUP_TIPS } else { &fresh };
    pool[rng.random_range(0..pool.len())]
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

/// What Claudia knows about the project: stack, recent decisions, milestones
/// and git activity. `None` when there is nothing to say.
pub fn recovery_context(env: &HookEnv, cfg: &UserConfig) -> Option<String> {
    let mut parts = Vec::new();
    let ctx = project_context::load_project_context(env, None);

    if let Some(stack) = ctx.get("stack").filter(|s| truthy(s)) {
        parts.push(format!("Project stack: {}", stack));
    }
    if let Some(decisions) = ctx.get("decisions").and_then(|d| d.as_array()).filter(|d| !d.is_empty()) {
        let recent: Vec<String> = decisions
            .iter()
            .skip(decisions.len().saturating_sub(5))
            .map(|d| match d {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        parts.push(format!("Decisions made this session: {}", recent.join("; ")));
    }
    if cfg.is_beginner() {
        parts.push("User experience level: beginner. Use simple language, explain jargon.".to_string());
    }

    let achieved = milestones::load_state(&env.state_dir).achieved;
    if !achieved.is_empty() {
        let names: Vec<&str> = achieved.iter().map(String::as_str).collect();
        parts.push(format!("Milestones achieved: {}", names.join(", ")));
    }

    if let Some(log) = git_state::recent_commits(&env.cwd) {
        parts.push(format!("Recent commits:\n{}", log));
    }
    if let Some(status) = git_state::short_status(&env.cwd) {
        parts.push(format!("Uncommitted changes:\n{}", status));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Text for the assistant and the user for one SessionStart event.
#[derive(Debug, Default, PartialEq, Eq)]
struct SessionMessage {
    context: Vec<String>,
    visible: Vec<String>,
}

fn session_message<R: Rng + ?Sized>(
    source: &str,
    cfg: &UserConfig,
    state: &mut SessionState,
    env: &HookEnv,
    rng: &mut R,
) -> SessionMessage {
    let beginner = cfg.is_beginner();
    let mut msg = SessionMessage::default();

    match source {
        "startup" => {
            if !state.shown_greeting {
                state.shown_greeting = true;
                msg.context.push(greeting(beginner));
                msg.visible.push(
                    if beginner { BEGINNER_GREETING_LINE } else { FULL_GREETING_LINE }.to_string(),
                );
            }
            if beginner && !state.shown_startup_tip {
                let tip = pick_startup_tip(rng, &state.shown_tips_history);
                state.shown_startup_tip = true;
                state.shown_tips_history.push(tip.to_string());
                let line = format!("\u{1f4a1} Claudia tip: {}", tip);
                msg.context.push(line.clone());
                msg.visible.push(line);
            }
        }
        "compact" => {
            if let Some(recovered) = recovery_context(env, cfg) {
                msg.context.push(format!(
                    "Claudia context recovery: The conversation was just compacted. \
                     Here is what Claudia knows about the current project and session:\n\n{}\n\n\
                     Use this context to stay grounded. Don't mention compaction unless the user asks.",
                    recovered
                ));
            }
            let tip = if beginner && !state.shown_compact_tip {
                state.shown_compact_tip = true;
                Some(format!("\u{1f4a1} Claudia: {}", COMPACT_TIP))
            } else if !beginner {
                Some("\u{1f4a1} Claudia: Context compacted. I've caught Claude up on your project.".to_string())
            } else {
                None
            };
            if let Some(tip) = tip {
                msg.context.push(tip.clone());
                msg.visible.push(tip);
            }
        }
        "resume" => {
            if let Some(recovered) = recovery_context(env, cfg) {
                msg.context.push(format!(
                    "Claudia context recovery: This is a resumed session. \
                     Here is what Claudia knows about the current project:\n\n{}\n\n\
                     Use this context to stay grounded.",
                    recovered
                ));
            }
            if !state.shown_resume_tip {
                state.shown_resume_tip = true;
                let tip = "\u{1f4a1} Claudia: Welcome back. I've caught Claude up on your project.".to_string();
                msg.context.push(tip.clone());
                msg.visible.push(tip);
            }
        }
        _ => {}
    }
    msg
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    let cfg = user_config::load_user_config(env);
    handle_with(input, env, &cfg, &mut rand::rng())
}

fn handle_with<R: Rng + ?Sized>(
    input: &HookInput,
    env: &HookEnv,
    cfg: &UserConfig,
    rng: &mut R,
) -> Result<HookOutput, String> {
    let source = input.str_field("source").unwrap_or_default();
    if !gating::session_source(cfg, source) {
        return Ok(HookOutput::empty());
    }

    let store = SessionStore::new(&env.state_dir, STATE_NAME);
    let sid = input.session_id();
    let mut state: SessionState = store.load(sid);
    let msg = session_message(source, cfg, &mut state, env, rng);
    if msg.context.is_empty() {
        return Ok(HookOutput::empty());
    }
    store.save(sid, &state);

    let visible = (!msg.visible.is_empty())
        .then(|| utils::colorize(COLOR_NOTICE, &msg.visible.join(" | ")));
    Ok(HookOutput::advisory(Some(msg.context.join("\n\n")), visible))
}
