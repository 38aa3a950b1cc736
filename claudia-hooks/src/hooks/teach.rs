//! Teaching moments: when the assistant mentions a technology or the
//! conversation shows a recognizable error, offer a one-line explanation.
//!
//! One tip per turn. Each keyword is taught at most once per session, and a
//! user can silence a keyword or a whole category through `suppress_topics`.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dedup::session_key;
use super::state::SessionStore;
use super::stop_dispatch::{self, StopCheck, StopResult};
use super::types::{HookEnv, HookInput, HookOutput};
use super::utils::{self, COLOR_NOTICE};
use crate::commands::gating;
use crate::commands::user_config::UserConfig;

pub const STATE_NAME: &str = "teach";
const EXPLAIN_COMMAND: &str = "/claudia:explain";
const ERRORS_TOPIC: &str = "errors";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachState {
    #[serde(default)]
    pub shown_keywords: BTreeSet<String>,
    #[serde(default)]
    pub revealed_commands: BTreeSet<String>,
}

impl TeachState {
    /// Accept the current object form or the older flat list of bare
    /// keywords, which is re-keyed under `session_id`.
    pub fn from_value(value: Value, session_id: &str) -> TeachState {
        match value {
            Value::Array(items) => TeachState {
                shown_keywords: items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|k| session_key(session_id, k))
                    .collect(),
                revealed_commands: BTreeSet::new(),
            },
            other => serde_json::from_value(other).unwrap_or_default(),
        }
    }
}

struct Category {
    name: &'static str,
    keywords: &'static [(&'static str, &'static str)],
}

const KEYWORDS: &[Category] = &[
    Category {
        name: "hosting",
        keywords: &[
            ("Vercel", "a platform for deploying frontend apps and serverless functions"),
            ("Netlify", "a platform for deploying static sites and serverless functions"),
            ("Railway", "a platform for deploying apps and databases with minimal config"),
            ("Fly.io", "a platform for running apps close to users globally"),
            ("Render", "a cloud platform for deploying web services and databases"),
            ("Heroku", "a cloud platform for deploying apps (one of the originals)"),
            ("AWS", "Amazon Web Services, the biggest cloud provider"),
            ("GCP", "Google Cloud Platform, Google's cloud infrastructure"),
            ("Azure", "Microsoft's cloud platform"),
        ],
    },
    Category {
        name: "databases",
        keywords: &[
            ("Postgres", "a powerful open-source relational database"),
            ("PostgreSQL", "a powerful open-source relational database"),
            ("MongoDB", "a document database that stores data as JSON-like objects"),
            ("Redis", "an in-memory data store, often used for caching"),
            ("SQLite", "a lightweight database that lives in a single file"),
            ("Supabase", "an open-source Firebase alternative built on Postgres"),
            ("PlanetScale", "a serverless MySQL platform with branching"),
            ("Prisma", "a TypeScript ORM that generates type-safe database queries"),
        ],
    },
    Category {
        name: "frameworks",
        keywords: &[
            ("Next.js", "a React framework for building full-stack web apps"),
            ("React", "a JavaScript library for building user interfaces"),
            ("Vue", "a progressive JavaScript framework for building UIs"),
            ("Svelte", "a compiler that turns components into efficient JavaScript"),
            ("Astro", "a framework for building content-focused websites"),
            ("Express", "a minimal Node.js web framework for building APIs"),
            ("FastAPI", "a modern Python web framework for building APIs"),
        ],
    },
    Category {
        name: "tools",
        keywords: &[
            ("Docker", "a tool for packaging apps into containers that run anywhere"),
            ("Kubernetes", "a system for managing containerized apps at scale"),
            ("Terraform", "infrastructure-as-code tool for provisioning cloud resources"),
            ("GitHub Actions", "CI/CD automation built into GitHub"),
            ("Webpack", "a module bundler for JavaScript applications"),
            ("Vite", "a fast build tool and dev server for modern web projects"),
        ],
    },
    Category {
        name: "concepts",
        keywords: &[
            ("API", "Application Programming Interface: how programs talk to each other"),
            ("REST", "a common pattern for designing web APIs using HTTP methods"),
            ("GraphQL", "a query language for APIs that lets you ask for exactly what you need"),
            ("WebSocket", "a protocol for real-time two-way communication between client and server"),
            ("OAuth", "a standard for letting apps access your data without your password"),
            ("JWT", "JSON Web Token, a compact way to securely transmit info between parties"),
            ("CI/CD", "Continuous Integration/Delivery: automating testing and deployment"),
            ("SSR", "Server-Side Rendering: generating HTML on the server for each request"),
            ("SSG", "Static Site Generation: pre-building HTML pages at build time"),
        ],
    },
];

const ERROR_PATTERNS: &[(&str, &str)] = &[
    (r"\berror\b.*\b(ENOENT|EACCES|EPERM|ECONNREFUSED)\b", "a system error"),
    (r"\bundefined is not a function\b", "a common JavaScript type error"),
    (r"\bCannot read propert(?:y|ies) of (undefined|null)\b", "a null reference error"),
    (r"\bModule not found\b", "a missing dependency error"),
    (r"\bSyntaxError\b", "a syntax error"),
    (r"\bTypeError\b", "a type error"),
    (r"\bReferenceError\b", "a reference error, usually a typo or missing variable"),
];

struct KeywordMatcher {
    category: &'static str,
    keyword: &'static str,
    description: &'static str,
    re: Regex,
}

fn keyword_matchers() -> &'static Vec<KeywordMatcher> {
    static RE: OnceLock<Vec<KeywordMatcher>> = OnceLock::new();
    RE.get_or_init(|| {
        KEYWORDS
            .iter()
            .flat_map(|cat| cat.keywords.iter().map(move |kw| (cat.name, kw)))
            .filter_map(|(category, &(keyword, description))| {
                let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword))).ok()?;
                Some(KeywordMatcher {
                    category,
                    keyword,
                    description,
                    re,
                })
            })
            .collect()
    })
}

fn error_matchers() -> &'static Vec<(Regex, &'static str)> {
    static RE: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RE.get_or_init(|| {
        ERROR_PATTERNS
            .iter()
            .filter_map(|&(p, desc)| Regex::new(&format!("(?i){}", p)).ok().map(|re| (re, desc)))
            .collect()
    })
}

struct Tip {
    topic: String,
    dedup_key: String,
    context: String,
    visible: String,
    reveals_explain: bool,
}

fn keyword_tip(message: &str, sid: &str, state: &TeachState, cfg: &UserConfig) -> Option<Tip> {
    let explain_known = state.revealed_commands.contains(EXPLAIN_COMMAND);
    keyword_matchers()
        .iter()
        .filter(|m| !cfg.topic_suppressed(m.keyword, m.category))
        .filter(|m| !state.shown_keywords.contains(&session_key(sid, &m.keyword.to_lowercase())))
        .find(|m| m.re.is_match(message))
        .map(|m| {
            let topic = m.keyword.to_lowercase();
            let mut context = format!(
                "I noticed we're talking about {} ({}). Want me to explain more?",
                m.keyword, m.description
            );
            if !explain_known {
                context.push_str(&format!(" Just say `{} {}`", EXPLAIN_COMMAND, topic));
            }
            Tip {
                dedup_key: session_key(sid, &topic),
                visible: format!("{}: {}", m.keyword, m.description),
                topic,
                context,
                reveals_explain: !explain_known,
            }
        })
}

fn error_tip(message: &str, sid: &str, state: &TeachState, cfg: &UserConfig) -> Option<Tip> {
    if cfg.topic_suppressed(ERRORS_TOPIC, ERRORS_TOPIC) {
        return None;
    }
    error_matchers()
        .iter()
        .filter(|(_, desc)| !state.shown_keywords.contains(&session_key(sid, &format!("error-{}", desc))))
        .find(|(re, _)| re.is_match(message))
        .map(|(_, desc)| Tip {
            topic: ERRORS_TOPIC.to_string(),
            dedup_key: session_key(sid, &format!("error-{}", desc)),
            context: format!(
                "That looks like {}. If you're not sure what it means, say `{}` and paste the error.",
                desc, EXPLAIN_COMMAND
            ),
            visible: format!("That looks like {}.", desc),
            reveals_explain: true,
        })
}

pub struct Teach;

impl StopCheck for Teach {
    fn hook(&self) -> &'static str {
        "teach"
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
        if !gating::teach(cfg) {
            return Ok(None);
        }

        let store = SessionStore::new(&env.state_dir, STATE_NAME);
        let sid = input.session_id();
        let mut state = TeachState::from_value(store.load(sid), sid);

        let tip = keyword_tip(message, sid, &state, cfg).or_else(|| {
            if gating::teach_errors(cfg) {
                error_tip(message, sid, &state, cfg)
            } else {
                None
            }
        });
        let Some(tip) = tip else {
            return Ok(None);
        };

        state.shown_keywords.insert(tip.dedup_key);
        if tip.reveals_explain {
            state.revealed_commands.insert(EXPLAIN_COMMAND.to_string());
        }

        let (user_hint, assistant_hint) = utils::topic_dismiss_hint(&tip.topic);
        Ok(Some(
            StopResult::new(format!("\u{1f4a1} Claudia: {}\n{}", tip.context, assistant_hint))
                .with_system_message(utils::colorize(
                    COLOR_NOTICE,
                    &format!("\u{1f4a1} {}\n{}", tip.visible, user_hint),
                ))
                .persist(store.path(sid), &state),
        ))
    }
}

pub fn handle(input: &HookInput, env: &HookEnv) -> Result<HookOutput, String> {
    stop_dispatch::handle_single(&Teach, input, env)
}
