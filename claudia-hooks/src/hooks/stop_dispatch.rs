//! Stop-event dispatch: milestones, run suggestions, next steps, teach.
//!
//! Checks are evaluated in priority order and the first one with something to
//! say wins. The turn lock is taken only once a winner exists, and the
//! winner's state writes are committed only after the lock is held, so a
//! losing invocation neither prints nor persists.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use super::milestones::Milestones;
use super::next_steps::NextSteps;
use super::run_suggest::RunSuggest;
use super::stop_lock;
use super::teach::Teach;
use super::types::{HookEnv, HookInput, HookOutput};
use crate::commands::atomic_io;
use crate::commands::user_config::{self, UserConfig};

#[derive(Debug, Clone, PartialEq)]
struct PendingWrite {
    path: PathBuf,
    body: Value,
}

/// Output of a Stop check plus the state it wants saved if it wins.
#[derive(Debug, Clone, PartialEq)]
pub struct StopResult {
    pub additional_context: String,
    pub system_message: Option<String>,
    writes: Vec<PendingWrite>,
}

impl StopResult {
    pub fn new(additional_context: impl Into<String>) -> Self {
        Self {
            additional_context: additional_context.into(),
            system_message: None,
            writes: Vec::new(),
        }
    }

    pub fn with_system_message(mut self, message: impl Into<String>) -> Self {
        self.system_message = Some(message.into());
        self
    }

    /// Queue a JSON document to be written when this result is emitted.
    pub fn persist<T: Serialize + ?Sized>(mut self, path: PathBuf, value: &T) -> Self {
        if let Ok(body) = serde_json::to_value(value) {
            self.writes.push(PendingWrite { path, body });
        }
        self
    }

    pub fn commit(&self) {
        for w in &self.writes {
            let _ = atomic_io::write_json(&w.path, &w.body);
        }
    }

    pub fn into_output(self) -> HookOutput {
        HookOutput::advisory(Some(self.additional_context), self.system_message)
    }
}

/// One Stop-family check.
pub trait StopCheck: Sync {
    /// Short name matched against `suppress_hooks`.
    fn hook(&self) -> &'static str;

    /// Decide whether this turn deserves output. Must not write state that
    /// belongs to the result; queue it on the [`StopResult`] instead.
    fn evaluate(
        &self,
        input: &HookInput,
        cfg: &UserConfig,
        env: &HookEnv,
    ) -> Result<Option<StopResult>, String>;
}

/// Priority order.
pub static STOP_CHECKS: &[&dyn StopCheck] = &[&Milestones, &RunSuggest, &NextSteps, &Teach];

/// Run `checks` in order; first result wins. Failing checks are skipped
/// silently. Nothing is printed or saved unless the turn lock is acquired.
pub fn run_checks(
    checks: &[&dyn StopCheck],
    input: &HookInput,
    cfg: &UserConfig,
    env: &HookEnv,
) -> HookOutput {
    for check in checks {
        if cfg.hook_suppressed(check.hook()) {
            continue;
        }
        match check.evaluate(input, cfg, env) {
            Ok(Some(result)) => {
                if !stop_lock::try_acquire(&env.state_dir, input.session_id()) {
                    return HookOutput::empty();
                }
                result.commit();
                return result.into_output();
            }
            Ok(None) | Err(_) => continue,
        }
    }
    HookOutput::empty()
}

/// `claudia hook stop`: the whole family in one process.
pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    let cfg = user_config::load_user_config(env);
    Ok(run_checks(STOP_CHECKS, input, &cfg, env))
}

/// Run one check on its own, with the same lock and commit rules.
pub fn handle_single(
    check: &dyn StopCheck,
    input: &HookInput,
    env: &HookEnv,
) -> Result<HookOutput, String> {
    let cfg = user_config::load_user_config(env);
    Ok(run_checks(&[check], input, &cfg, env))
}

/// `last_assistant_message`, when present and non-empty.
pub fn assistant_message(input: &HookInput) -> Option<&str> {
    input
        .str_field("last_assistant_message")
        .filter(|m| !m.is_empty())
}
