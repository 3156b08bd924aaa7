//! Query shaping and response clean-up for cricket research.

use std::sync::LazyLock;

use regex::Regex;

static CRICKET_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(cricket|ipl|odi|t20|test match|batsman|bowler|wicket|run|over|innings|century|captain|icc|bcci|cricketer)\b",
    )
    .unwrap()
});

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").unwrap());

pub const NO_DISPLAYABLE_CONTENT: &str =
    "No displayable content was found in the research results.";

pub const DEFAULT_IMAGE_CONTEXT: &str = "Cricket Image";

const DEPTH_REQUEST: &str = "\
Please provide comprehensive cricket analysis with:
1. Latest statistics and records
2. Historical context and significance
3. Statistical tables and trends
4. Expert analysis from credible cricket sources
5. Quotes from players or coaches when relevant
6. Both career overview and recent form for players
7. Multiple perspectives on debated topics
8. URLs to high-quality images of relevant players, teams or venues

For statistical comparisons, include data that can be rendered as charts.";

/// Shape a user query into a research prompt.
///
/// Queries that already use cricket vocabulary get a depth request appended;
/// anything else is framed as a cricket question first.
pub fn enhance_query(query: &str) -> String {
    let query = query.trim();
    if CRICKET_TERMS.is_match(query) {
        format!("{query}\n\n{DEPTH_REQUEST}")
    } else {
        format!("Conduct in-depth cricket research on: {query}\n\n{DEPTH_REQUEST}")
    }
}

/// Strip `<think>` reasoning blocks that some models emit before their answer.
pub fn filter_internal_content(content: &str) -> String {
    let cleaned = THINK_BLOCK.replace_all(content, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        NO_DISPLAYABLE_CONTENT.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Derive a caption from an image URL's file name: `virat-kohli_bat.jpg` -> `Virat Kohli Bat`.
pub fn image_context_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let filename = path.rsplit('/').next().unwrap_or_default();
    let stem = match filename.rfind('.') {
        Some(dot) if dot > 0 => &filename[..dot],
        _ => filename,
    };

    let context = stem
        .split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");

    if context.is_empty() {
        DEFAULT_IMAGE_CONTEXT.to_string()
    } else {
        context
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
