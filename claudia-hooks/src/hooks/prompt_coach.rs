//! UserPromptSubmit: spot a stuck or vague prompt and tell the assistant how
//! to respond. Capped at three coaching moments per session.

use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

use super::state::SessionStore;
use super::types::{HookEnv, HookInput, HookOutput};
use super::utils::{self, COLOR_WARN};
use crate::commands::gating;
use crate::commands::user_config::{self, UserConfig};

pub const STATE_NAME: &str = "coach";
pub const HOOK: &str = "prompt-coach";
pub const MAX_PER_SESSION: u32 = 3;
const SHORT_PROMPT_CHARS: usize = 15;
const CAPS_MIN_CHARS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachState {
    #[serde(default)]
    pub count: u32,
}

const STUCK_PATTERNS: &[&str] = &[
    r"^(help|stuck|idk|i don'?t know|confused|lost)\s*[.!?]*$",
    r"^(what do i do|where do i start|how do i even|i'?m stuck|i'?m lost|i'?m confused)\s*[.!?]*$",
    r"^(i have no idea|no clue|what now|now what)\s*[.!?]*$",
    r"^(i give up|this is impossible|nothing works|everything is broken)\s*[.!?]*$",
    r"^(can you help|please help|help me)\s*[.!?]*$",
    r"^(i don'?t understand|i don'?t get it|makes no sense)\s*[.!?]*$",
    r"^(where am i|what happened|what went wrong)\s*[.!?]*$",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vagueness {
    NoContext,
    TooShort,
    /// Bare confirmations are fine in context.
    SingleWord,
}

const VAGUE_PATTERNS: &[(&str, Vagueness)] = &[
    (r"^(fix it|fix this|make it work|help me|do it|just do it)\s*[.!?]*$", Vagueness::NoContext),
    (r"^(it'?s? broken|doesn'?t work|not working|it broke|broken)\s*[.!?]*$", Vagueness::NoContext),
    (r"^(change it|update it|redo it|do it again|try again)\s*[.!?]*$", Vagueness::NoContext),
    (r"^(it'?s? wrong|that'?s wrong|wrong|bad|no good)\s*[.!?]*$", Vagueness::NoContext),
    (r"^(make it better|improve it|clean it up)\s*[.!?]*$", Vagueness::NoContext),
    (r"^(what|why|how)\s*[.!?]*$", Vagueness::TooShort),
    (r"^(yes|no|ok|okay|sure|yeah|yep|nah|nope)\s*[.!?]*$", Vagueness::SingleWord),
];

const KNOWN_SHORT_COMMANDS: &str = r"(?i)^(yes|no|ok|okay|sure|yeah|yep|nah|nope|thanks|ty|thx|commit this|push it|push this|run tests|run it|do this|ship it|test it|build it|deploy it|lint it|format it|save it|merge it|revert it|undo that)\b";

fn stuck_set() -> Option<&'static RegexSet> {
    static RE: OnceLock<Option<RegexSet>> = OnceLock::new();
    RE.get_or_init(|| RegexSet::new(STUCK_PATTERNS.iter().map(|p| format!("(?i){}", p))).ok())
        .as_ref()
}

fn vague_res() -> &'static Vec<(Regex, Vagueness)> {
    static RE: OnceLock<Vec<(Regex, Vagueness)>> = OnceLock::new();
    RE.get_or_init(|| {
        VAGUE_PATTERNS
            .iter()
            .filter_map(|&(p, kind)| Regex::new(&format!("(?i){}", p)).ok().map(|re| (re, kind)))
            .collect()
    })
}

fn known_short_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(KNOWN_SHORT_COMMANDS).ok()).as_ref()
}

fn repeated_punct_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[!?]{3,}").ok()).as_ref()
}

/// At least one cased letter and no lowercase ones.
fn is_all_caps(s: &str) -> bool {
    s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase)
}

/// A coaching note for the assistant and the line the user sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coaching {
    pub note: String,
    pub user_message: &'static str,
}

impl Coaching {
    fn new(note: impl Into<String>, user_message: &'static str) -> Self {
        Self {
            note: note.into(),
            user_message,
        }
    }
}

/// Decide whether `prompt` (already trimmed) deserves coaching.
pub fn coach(prompt: &str, cfg: &UserConfig) -> Option<Coaching> {
    if gating::stuck_detection(cfg) && stuck_set().is_some_and(|set| set.is_match(prompt)) {
        return Some(Coaching::new(
            "Claudia note: The user seems stuck. Don't overwhelm them. \
             Ask ONE clarifying question to understand what they're trying to do. \
             Then suggest ONE small, concrete next step. Keep it to 2-3 sentences. \
             Examples of good questions: 'What are you trying to build?' or \
             'What happened right before you got stuck?' \
             If they've been working on something, reference it specifically.",
            "Claudia is helping Claude ask you the right questions.",
        ));
    }

    if !gating::vague_prompt_coaching(cfg) {
        return None;
    }

    if let Some((_, kind)) = vague_res().iter().find(|(re, _)| re.is_match(prompt)) {
        return match kind {
            Vagueness::NoContext => Some(Coaching::new(
                format!(
                    "Claudia note: The user's prompt is vague. They said something like \
                     \"{}\" with no specific context. As a beginner, they may not know \
                     how to ask for what they need. Help them by asking 1-2 clarifying \
                     questions before diving in. For example: What file are you working on? \
                     What did you expect to happen vs what actually happened?",
                    prompt
                ),
                "Claudia is coaching Claude to ask you clarifying questions first.",
            )),
            Vagueness::TooShort => Some(Coaching::new(
                "Claudia note: The user's prompt is very short and lacks context. \
                 Gently ask them to elaborate: what specifically do they want to know? \
                 What are they trying to build or fix?",
                "Claudia is nudging Claude to help you be more specific.",
            )),
            Vagueness::SingleWord => None,
        };
    }

    if cfg.is_beginner()
        && prompt.chars().count() < SHORT_PROMPT_CHARS
        && !known_short_re().is_some_and(|re| re.is_match(prompt))
    {
        return Some(Coaching::new(
            "Claudia note: The user's prompt is quite short. They might benefit from \
             a gentle nudge to be more specific. Before responding, consider asking: \
             What are you trying to accomplish? Is there a specific file or error involved?",
            "Claudia is nudging Claude to help you be more specific.",
        ));
    }

    if is_all_caps(prompt) && prompt.chars().count() > CAPS_MIN_CHARS {
        return Some(Coaching::new(
            "Claudia note: The user seems frustrated (all caps). Acknowledge their frustration \
             briefly, then help them break the problem down step by step. Stay calm and supportive.",
            "Claudia noticed you might be frustrated. She's telling Claude to slow down and help.",
        ));
    }

    if repeated_punct_re().is_some_and(|re| re.is_match(prompt)) {
        return Some(Coaching::new(
            "Claudia note: The user seems emphatic or frustrated. Take a step back: \
             summarize what you understand about their problem, confirm you're on the same page, \
             then propose ONE concrete next step.",
            "Claudia is telling Claude to check in with you before continuing.",
        ));
    }

    None
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    let cfg = user_config::load_user_config(env);
    handle_with(input, env, &cfg)
}

fn handle_with(input: &HookInput, env: &HookEnv, cfg: &UserConfig) -> Result<HookOutput, String> {
    let prompt = input.str_field("prompt").unwrap_or_default().trim();
    if prompt.is_empty() || cfg.hook_suppressed(HOOK) || prompt.starts_with('/') {
        return Ok(HookOutput::empty());
    }

    let store = SessionStore::new(&env.state_dir, STATE_NAME);
    let sid = input.session_id();
    let mut state: CoachState = store.load(sid);
    if state.count >= MAX_PER_SESSION {
        return Ok(HookOutput::empty());
    }

    let Some(coaching) = coach(prompt, cfg) else {
        return Ok(HookOutput::empty());
    };
    state.count += 1;
    store.save(sid, &state);

    let mut context = coaching.note;
    let mut visible = coaching.user_message.to_string();
    if state.count % 2 == 0 {
        let (user_hint, assistant_hint) = utils::dismiss_hint(HOOK);
        visible.push('\n');
        visible.push_str(&user_hint);
        context.push('\n');
        context.push_str(&assistant_hint);
    }
    Ok(HookOutput::advisory(
        Some(context),
        Some(utils::colorize(COLOR_WARN, &visible)),
    ))
}
