use crate::content::{CompanyProfile, json, lenient};
use crate::generation::TextGenerator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{instrument, warn};

const SYSTEM: &str = "You are an SEO strategist that returns only JSON arrays.";

/// A candidate subject for one article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, alias = "primary_keyword", deserialize_with = "lenient::string")]
    pub keyword: String,
    #[serde(
        default,
        deserialize_with = "lenient::string_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub long_tail_keywords: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub intent: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub why_it_fits_company: Option<String>,
    #[serde(
        default,
        alias = "SEO_priority_score",
        deserialize_with = "lenient::opt_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Topic {
    pub fn new(title: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            keyword: keyword.into(),
            ..Self::default()
        }
    }

    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }
}

/// Identity key for a topic: trimmed and lowercased.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Topics from a parsed model response or a legacy topic file.
///
/// Accepts a bare array, an object wrapping an array (such as
/// `{"topics": [...]}`), a single topic object, or plain title strings.
/// Entries that cannot be read as a topic are skipped.
pub fn parse_topics(value: Value) -> Vec<Topic> {
    match value {
        Value::Array(items) => items.into_iter().filter_map(topic_from).collect(),
        Value::Object(map) if map.len() == 1 && map.contains_key(json::UNPARSED_KEY) => {
            warn!("topic proposal was not valid JSON");
            Vec::new()
        }
        Value::Object(map) if map.contains_key("title") => {
            topic_from(Value::Object(map)).into_iter().collect()
        }
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .map(|items| items.into_iter().filter_map(topic_from).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn topic_from(value: Value) -> Option<Topic> {
    match value {
        Value::String(title) => Some(Topic::new(title.trim(), "")),
        Value::Object(_) => serde_json::from_value::<Topic>(value)
            .map_err(|e| warn!("skipping malformed topic: {}", e))
            .ok(),
        _ => None,
    }
}

/// Ask the backend for `count` new topics that avoid every title in
/// `known_titles`. Empty on any failure.
///
/// The caller still filters duplicates; the instruction in the prompt is a
/// hint the model may ignore.
#[instrument(skip(generator, profile, known_titles), fields(known = known_titles.len()))]
pub async fn propose_topics(
    generator: &dyn TextGenerator,
    profile: &CompanyProfile,
    base_url: &str,
    known_titles: &[String],
    count: usize,
) -> Vec<Topic> {
    let existing = if known_titles.is_empty() {
        "(none yet)".to_string()
    } else {
        known_titles
            .iter()
            .map(|t| format!("- {t}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let prompt = format!(
        "You are an expert SEO content strategist.
Input company profile:
{profile}

Website: {base_url}

Titles already written or planned (do NOT repeat or closely paraphrase any of them):
{existing}

Generate {count} NEW blog post topics tailored to this company with high ranking potential.
Return a JSON array of {count} objects with:
- title
- primary_keyword
- long_tail_keywords (array, 2-3 items)
- intent (informational/commercial/transactional)
- why_it_fits_company (1-2 lines)
- SEO_priority_score (1-100)

Return ONLY JSON (no commentary, no markdown fences).
",
        profile = profile.to_prompt_json(),
    );

    match generator.complete(SYSTEM, &prompt).await {
        Ok(raw) => parse_topics(json::parse_structured(&raw)),
        Err(e) => {
            warn!("topic proposal failed for {}: {}", base_url, e);
            Vec::new()
        }
    }
}
