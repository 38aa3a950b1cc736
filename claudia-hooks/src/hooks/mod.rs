//! Hook handlers for the assistant's lifecycle events.
//!
//! Supported hooks and their handlers:
//!   - **pre-tool-use**: `check_secrets`, `check_git_hygiene` (blocking), then the
//!     advisory pattern checkers merged into one message
//!   - **post-tool-use** advisory checkers: `check_accessibility`, `check_css`,
//!     `check_deps`, `check_dockerfile`, `check_license`, `check_practices`,
//!     plus the advisory half of `check_git_hygiene`
//!   - **stop**: `stop_dispatch` runs `milestones`, `run_suggest`, `next_steps`, `teach`
//!   - **session-start**: `session_tips`
//!   - **pre-compact**: `compact_tip`
//!   - **user-prompt-submit**: `prompt_coach`
//!
//! All hooks are dispatched via `dispatcher::dispatch()`.
//! Entry point: `claudia hook <hook-name>` (reads JSON from stdin).

// Hook infrastructure
pub mod dedup;
pub mod dispatcher;
pub mod patterns;
pub mod state;
pub mod stop_lock;
pub mod types;
pub mod utils;

// Pattern checkers
pub mod check_accessibility;
pub mod check_css;
pub mod check_deps;
pub mod check_dockerfile;
pub mod check_git_hygiene;
pub mod check_license;
pub mod check_practices;
pub mod check_secrets;

// Stop-event checks
pub mod milestones;
pub mod next_steps;
pub mod run_suggest;
pub mod stop_dispatch;
pub mod teach;

// Session, compaction and prompt coaching
pub mod compact_tip;
pub mod prompt_coach;
pub mod session_tips;
