//! Generic rule engine shared by every write-triggered checker.
//!
//! A checker supplies a static table of [`Rule`]s plus a file-relevance
//! predicate; the engine compiles the table once per process, applies the
//! rules in order and hands back existence-only [`Finding`]s. Rules are
//! compiled with `fancy_regex` because several tables rely on lookaround.

use std::borrow::Cow;
use std::path::Path;

use fancy_regex::Regex;

use super::dedup;
use super::state::SessionStore;
use super::types::{HookEnv, HookInput, HookName, HookOutput, WriteEvent};
use super::utils;

/// One entry of a checker's rule table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub pattern: &'static str,
    /// When this also matches, the rule stays silent.
    pub suppress: Option<&'static str>,
    pub description: &'static str,
    pub advice: &'static str,
}

/// Regex flags applied to every rule of a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
}

impl MatchFlags {
    pub const CASE_SENSITIVE: MatchFlags = MatchFlags {
        case_insensitive: false,
        multi_line: false,
        dot_matches_new_line: false,
    };

    pub const IGNORE_CASE: MatchFlags = MatchFlags {
        case_insensitive: true,
        multi_line: false,
        dot_matches_new_line: false,
    };

    fn inline_prefix(&self) -> String {
        let mut flags = String::new();
        if self.case_insensitive {
            flags.push('i');
        }
        if self.multi_line {
            flags.push('m');
        }
        if self.dot_matches_new_line {
            flags.push('s');
        }
        if flags.is_empty() {
            flags
        } else {
            format!("(?{})", flags)
        }
    }

    fn compile(&self, pattern: &str) -> Option<Regex> {
        Regex::new(&format!("{}{}", self.inline_prefix(), pattern)).ok()
    }
}

/// A rule that matched. Only `id` is persisted (for dedup).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub id: Cow<'static, str>,
    pub description: Cow<'static, str>,
    pub advice: Cow<'static, str>,
}

impl Finding {
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        description: impl Into<Cow<'static, str>>,
        advice: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            advice: advice.into(),
        }
    }

    pub fn from_rule(rule: &Rule) -> Self {
        Self::new(rule.id, rule.description, rule.advice)
    }

    /// `- description: advice`
    pub fn line(&self) -> String {
        format!("- {}: {}", self.description, self.advice)
    }
}

struct CompiledRule {
    rule: Rule,
    matcher: Regex,
    suppress: Option<Regex>,
}

/// A compiled rule table.
pub struct Ruleset {
    rules: Vec<CompiledRule>,
}

impl Ruleset {
    /// Compile `rules` with `flags`. A rule whose pattern fails to compile is
    /// dropped rather than taking the whole table down.
    pub fn compile(rules: &[Rule], flags: MatchFlags) -> Ruleset {
        let rules = rules
            .iter()
            .filter_map(|rule| {
                let matcher = flags.compile(rule.pattern)?;
                let suppress = match rule.suppress {
                    Some(p) => Some(flags.compile(p)?),
                    None => None,
                };
                Some(CompiledRule {
                    rule: *rule,
                    matcher,
                    suppress,
                })
            })
            .collect();
        Ruleset { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn check(&self, content: &str) -> Vec<Finding> {
        self.check_filtered(content, |_| false)
    }

    /// Apply every rule in order, skipping ids for which `skip` is true.
    pub fn check_filtered(&self, content: &str, skip: impl Fn(&str) -> bool) -> Vec<Finding> {
        self.rules
            .iter()
            .filter(|c| !skip(c.rule.id))
            .filter(|c| is_match(&c.matcher, content))
            .filter(|c| !c.suppress.as_ref().is_some_and(|s| is_match(s, content)))
            .map(|c| Finding::from_rule(&c.rule))
            .collect()
    }

    /// True when any rule matches; used for absence rules.
    pub fn any_match(&self, content: &str) -> bool {
        self.rules.iter().any(|c| is_match(&c.matcher, content))
    }
}

/// Backtracking-limit errors count as "no match".
fn is_match(re: &Regex, content: &str) -> bool {
    re.is_match(content).unwrap_or(false)
}

/// A domain checker plugged into the advisory pipeline.
pub trait AdvisoryChecker: Sync {
    fn hook(&self) -> HookName;

    /// `<checker>` segment of the session state filename.
    fn state_name(&self) -> &'static str;

    /// Fast exit: false skips the file without running any rule.
    fn is_relevant(&self, event: &WriteEvent) -> bool;

    fn findings(&self, event: &WriteEvent) -> Vec<Finding>;

    /// First line of the combined message.
    fn heading(&self, event: &WriteEvent) -> String;

    /// ANSI colour for the `systemMessage`, `None` for plain text.
    fn color(&self) -> Option<u8> {
        Some(utils::COLOR_WARN)
    }

    fn render_line(&self, finding: &Finding) -> String {
        finding.line()
    }
}

/// Run one checker end to end: relevance, rules, dedup, rendering.
/// Returns the `systemMessage` text when something new was found.
pub fn advisory_message(
    checker: &dyn AdvisoryChecker,
    event: &WriteEvent,
    state_dir: &Path,
) -> Option<String> {
    if !checker.is_relevant(event) {
        return None;
    }
    let findings = checker.findings(event);
    if findings.is_empty() {
        return None;
    }
    let store = SessionStore::new(state_dir, checker.state_name());
    let fresh = dedup::filter_new_findings(&store, &event.session_id, &event.file_path, findings);
    if fresh.is_empty() {
        return None;
    }
    let mut message = checker.heading(event);
    for finding in &fresh {
        message.push('\n');
        message.push_str(&checker.render_line(finding));
    }
    Some(match checker.color() {
        Some(code) => utils::colorize(code, &message),
        None => message,
    })
}

/// Hook entry point shared by the advisory checkers.
pub fn handle_advisory(
    checker: &dyn AdvisoryChecker,
    input: &HookInput,
    env: &HookEnv,
) -> Result<HookOutput, String> {
    let Some(event) = WriteEvent::from_hook_input(input) else {
        return Ok(HookOutput::empty());
    };
    Ok(HookOutput::advisory(
        None,
        advisory_message(checker, &event, &env.state_dir),
    ))
}
