//! Chat backed by live cricket statistics.
//!
//! Before the wrapped model answers, the latest user turn is scanned for what
//! it asks about (live matches, a match id, named players) and the matching
//! statistics API lookups are run. Their JSON goes into the system message so
//! the model answers from current numbers.

use std::sync::{Arc, LazyLock};

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use sportsgpt_core::{ChatMessage, ChatProvider, ChatRole};

use crate::prompts::CHAT_SYSTEM_PROMPT;
use crate::sports_api::SportsApiClient;

const MAX_PLAYERS: usize = 2;
/// Per-lookup cap on the JSON handed to the model.
const MAX_LOOKUP_CHARS: usize = 4000;

static LIVE_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(live|ongoing|today|right now|currently|current score)\b").unwrap()
});
static BOWLING_TERMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(bowl\w*|wickets?|economy)\b").unwrap());
static IPL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bipl\b").unwrap());
static MATCH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmatch\s+(?:id\s+)?#?(\d+)\b").unwrap());
static PROPER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z']+)+\b").unwrap());

/// Capitalised words that open questions rather than names.
const LEADING_WORDS: &[&str] = &[
    "Who", "What", "How", "When", "Where", "Which", "Why", "Is", "Are", "Was", "Did", "Does",
    "Can", "Tell", "Show", "Compare", "Give", "Get", "List", "The",
];

/// A statistics lookup a question calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    LiveMatches,
    Match(String),
    Player {
        name: String,
        bowling: bool,
        tournament: Option<String>,
    },
}

/// Decide which lookups `question` needs.
pub fn plan_lookups(question: &str) -> Vec<Lookup> {
    let mut lookups = Vec::new();
    if LIVE_TERMS.is_match(question) {
        lookups.push(Lookup::LiveMatches);
    }
    if let Some(id) = MATCH_ID.captures(question).and_then(|c| c.get(1)) {
        lookups.push(Lookup::Match(id.as_str().to_string()));
    }

    let bowling = BOWLING_TERMS.is_match(question);
    let tournament = IPL.is_match(question).then(|| "ipl".to_string());
    let mut names: Vec<String> = Vec::new();
    for candidate in PROPER_NAME.find_iter(question) {
        let words: Vec<&str> = candidate
            .as_str()
            .split_whitespace()
            .skip_while(|w| LEADING_WORDS.contains(w))
            .collect();
        if words.is_empty() {
            continue;
        }
        let name = words.join(" ");
        if !names.contains(&name) {
            names.push(name);
        }
    }
    lookups.extend(names.into_iter().take(MAX_PLAYERS).map(|name| Lookup::Player {
        name,
        bowling,
        tournament: tournament.clone(),
    }));
    lookups
}

/// First `id` in a search response: a bare array, or one under `players`/`data`/`results`.
fn first_id(results: &Value) -> Option<String> {
    let list = match results {
        Value::Array(items) => items,
        Value::Object(map) => ["players", "data", "results"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))?,
        _ => return None,
    };
    match list.first()?.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn truncate(json: &str) -> String {
    if json.chars().count() <= MAX_LOOKUP_CHARS {
        return json.to_string();
    }
    let mut cut: String = json.chars().take(MAX_LOOKUP_CHARS).collect();
    cut.push_str(" …(truncated)");
    cut
}

/// Wraps a chat model with statistics lookups for the latest user turn.
pub struct StatsAugmentedChat {
    inner: Arc<dyn ChatProvider>,
    stats: SportsApiClient,
}

impl StatsAugmentedChat {
    pub fn new(inner: Arc<dyn ChatProvider>, stats: SportsApiClient) -> Self {
        Self { inner, stats }
    }

    /// Run the lookups `question` needs, as `(label, data)` pairs. Failed lookups are skipped.
    pub async fn gather(&self, question: &str) -> Vec<(String, Value)> {
        let mut found = Vec::new();
        for lookup in plan_lookups(question) {
            if let Err(e) = self.run(&lookup, &mut found).await {
                warn!(?lookup, error = %e, "Statistics lookup failed; answering without it");
            }
        }
        found
    }

    async fn run(&self, lookup: &Lookup, found: &mut Vec<(String, Value)>) -> Result<()> {
        match lookup {
            Lookup::LiveMatches => {
                found.push(("Live matches".into(), self.stats.live_matches().await?));
            }
            Lookup::Match(id) => {
                found.push((format!("Match {id}"), self.stats.match_details(id).await?));
                found.push((
                    format!("Match {id} scorecard"),
                    self.stats.match_scorecard(id).await?,
                ));
            }
            Lookup::Player {
                name,
                bowling,
                tournament,
            } => {
                let results = self.stats.search_players(name).await?;
                let Some(id) = first_id(&results) else {
                    debug!(player = %name, "No player matched");
                    return Ok(());
                };
                found.push((format!("{name} statistics"), self.stats.player_stats(&id).await?));
                if *bowling {
                    found.push((
                        format!("{name} bowling"),
                        self.stats.bowling_stats(&id, tournament.as_deref()).await?,
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Add the statistics to the conversation's system message, creating one when absent.
fn with_statistics(messages: &[ChatMessage], found: &[(String, Value)]) -> Vec<ChatMessage> {
    let mut context = String::from(
        "Current data from the cricket statistics API (JSON). Prefer it over memory when it answers the question.",
    );
    for (label, data) in found {
        context.push_str(&format!("\n\n### {label}\n{}", truncate(&data.to_string())));
    }

    let mut conversation = messages.to_vec();
    match conversation.first_mut() {
        Some(first) if first.role == ChatRole::System => {
            first.content.push_str("\n\n");
            first.content.push_str(&context);
        }
        _ => conversation.insert(
            0,
            ChatMessage::new(ChatRole::System, format!("{CHAT_SYSTEM_PROMPT}\n\n{context}")),
        ),
    }
    conversation
}

#[async_trait]
impl ChatProvider for StatsAugmentedChat {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let question = messages
            .last()
            .filter(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str());
        let found = match question {
            Some(question) => self.gather(question).await,
            None => Vec::new(),
        };
        if found.is_empty() {
            return self.inner.chat(messages).await;
        }
        self.inner.chat(&with_statistics(messages, &found)).await
    }
}
