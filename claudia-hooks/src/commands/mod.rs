//! Shared services behind the hooks and the CLI subcommands.

pub mod atomic_io;
pub mod gating;
pub mod git_state;
pub mod project_context;
pub mod user_config;
