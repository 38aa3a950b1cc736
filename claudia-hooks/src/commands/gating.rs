//! Which hook families may fire for a given proactivity and experience.
//!
//! Pattern checkers and blocking gates are never gated; everything here
//! concerns the coaching and Stop-time hooks.

use super::user_config::{Proactivity, UserConfig};

/// Milestones and next-steps: beginners at moderate or above.
pub fn beginner_coaching(cfg: &UserConfig) -> bool {
    cfg.is_beginner() && cfg.proactivity >= Proactivity::Moderate
}

/// Run suggestions: beginners or anyone at high, never at low.
pub fn run_suggest(cfg: &UserConfig) -> bool {
    cfg.proactivity != Proactivity::Low && (cfg.is_beginner() || cfg.proactivity == Proactivity::High)
}

/// Concept teaching: beginners at moderate+, everyone else only at high.
pub fn teach(cfg: &UserConfig) -> bool {
    match cfg.proactivity {
        Proactivity::Low => false,
        Proactivity::Moderate => cfg.is_beginner(),
        Proactivity::High => true,
    }
}

/// Teach adds error-pattern explanations for beginners only.
pub fn teach_errors(cfg: &UserConfig) -> bool {
    teach(cfg) && cfg.is_beginner()
}

/// Stuck detection: beginners at moderate+, everyone at high.
pub fn stuck_detection(cfg: &UserConfig) -> bool {
    match cfg.proactivity {
        Proactivity::Low => false,
        Proactivity::Moderate => cfg.is_beginner(),
        Proactivity::High => true,
    }
}

pub fn vague_prompt_coaching(cfg: &UserConfig) -> bool {
    cfg.proactivity == Proactivity::High
}

pub fn compact_tip(cfg: &UserConfig) -> bool {
    cfg.is_beginner() && cfg.proactivity != Proactivity::Low
}

/// At low proactivity only the `startup` source is processed.
pub fn session_source(cfg: &UserConfig, source: &str) -> bool {
    cfg.proactivity != Proactivity::Low || source == "startup"
}
