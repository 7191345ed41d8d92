use crate::content::{CompanyProfile, Topic, truncate_chars};
use crate::generation::TextGenerator;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{instrument, warn};

const SYSTEM: &str = "You are an SEO blog writer.";
const META_DESC_LIMIT: usize = 155;

static META_TITLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<!--\s*META_TITLE:\s*(.*?)\s*-->$").unwrap());
static META_DESC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<!--\s*META_DESC:\s*(.*?)\s*-->$").unwrap());

/// The two metadata lines at the top of every article artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleMeta {
    pub title: String,
    pub description: String,
}

impl ArticleMeta {
    /// Read the metadata lines from the start of an article.
    pub fn parse(article: &str) -> Option<Self> {
        let mut lines = article.lines().map(str::trim).filter(|l| !l.is_empty());
        let title = META_TITLE_REGEX.captures(lines.next()?)?.get(1)?.as_str();
        let description = META_DESC_REGEX.captures(lines.next()?)?.get(1)?.as_str();
        Some(Self {
            title: title.to_string(),
            description: description.to_string(),
        })
    }
}

/// Full Markdown article following `guideline`. Empty on any failure.
#[instrument(skip_all, fields(title = %topic.title))]
pub async fn draft_article(
    generator: &dyn TextGenerator,
    topic: &Topic,
    guideline: &str,
    profile: &CompanyProfile,
    base_url: Option<&str>,
) -> String {
    let topic_json = serde_json::to_string_pretty(topic).unwrap_or_default();
    let base_line = base_url.map(|u| format!("BASE_URL: {u}")).unwrap_or_default();
    let prompt = format!(
        "You are an expert SEO copywriter. Using the guideline below, write a full SEO-optimized blog article in Markdown.
Follow the guideline strictly. Use headings (H1, H2, H3) and include paragraphs and bullet lists where applicable.

TOPIC:
{topic_json}

GUIDELINE:
{guideline}

COMPANY PROFILE:
{profile}

REQUIREMENTS:
- Output in Markdown (.md). Start with the meta title and meta description as HTML comments at the top:
  <!-- META_TITLE: ... -->
  <!-- META_DESC: ... -->
- Use the title from the guideline (or topic title) as H1.
- For each H2 in the guideline, create a well-written section of ~150-400 words (adjust to reach the target word count).
- Use bullet points for any lists specified in the guideline.
- Include local references / the company name naturally (do not spam).
- Insert suggested CTAs near the end and include an example button text.
- SEO: aim for ~1% keyword density for the primary keyword (use it naturally), include 2-3 long-tail keywords and LSI words.
- Include a short FAQ section if the guideline suggests.
- Do not invent unsupported statistics. If you include numbers, mark them as 'source needed'.
- Do NOT output JSON, only Markdown content.

{base_line}
",
        profile = profile.to_prompt_json(),
    );

    match generator.complete(SYSTEM, &prompt).await {
        Ok(raw) => finalize_article(&raw, topic),
        Err(e) => {
            warn!("article generation failed for '{}': {}", topic.title, e);
            String::new()
        }
    }
}

/// Normalize a drafted article: drop wrapping code fences and guarantee the
/// metadata lines followed by an H1. Blank drafts stay blank.
pub fn finalize_article(raw: &str, topic: &Topic) -> String {
    let body = strip_outer_fence(raw.trim());
    if body.trim().is_empty() {
        return String::new();
    }

    let mut meta_title = None;
    let mut meta_desc = None;
    let mut lines = Vec::new();
    for line in body.lines() {
        let trimmed = line.trim();
        if meta_title.is_none()
            && let Some(c) = META_TITLE_REGEX.captures(trimmed)
        {
            meta_title = Some(c[1].to_string());
            continue;
        }
        if meta_desc.is_none()
            && let Some(c) = META_DESC_REGEX.captures(trimmed)
        {
            meta_desc = Some(c[1].to_string());
            continue;
        }
        lines.push(line);
    }
    let mut body = lines.join("\n").trim().to_string();

    let heading = body
        .lines()
        .find_map(|l| l.trim().strip_prefix("# "))
        .map(|h| h.trim().to_string());
    let title = meta_title
        .filter(|t| !t.is_empty())
        .or(heading.clone())
        .unwrap_or_else(|| topic.title.clone());
    if heading.is_none() {
        body = format!("# {}\n\n{}", title, body);
    }

    let description = meta_desc
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| first_paragraph(&body));

    format!(
        "<!-- META_TITLE: {} -->\n<!-- META_DESC: {} -->\n\n{}\n",
        title,
        truncate_chars(&description, META_DESC_LIMIT),
        body
    )
}

fn strip_outer_fence(text: &str) -> String {
    if !text.starts_with("```") {
        return text.to_string();
    }
    let mut lines: Vec<&str> = text.lines().skip(1).collect();
    if lines.last().is_some_and(|l| l.trim() == "```") {
        lines.pop();
    }
    lines.join("\n")
}

fn first_paragraph(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .find(|l| {
            !l.is_empty()
                && !l.starts_with('#')
                && !l.starts_with('-')
                && !l.starts_with('*')
                && !l.starts_with("<!--")
        })
        .unwrap_or_default()
        .to_string()
}
