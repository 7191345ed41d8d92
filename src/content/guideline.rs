use crate::content::{CompanyProfile, Topic};
use crate::generation::TextGenerator;
use tracing::{instrument, warn};

const SYSTEM: &str = "You are an SEO guideline generator.";

/// Plain-text writing brief for one topic. Empty on any failure.
#[instrument(skip_all, fields(title = %topic.title))]
pub async fn expand_guideline(
    generator: &dyn TextGenerator,
    topic: &Topic,
    profile: &CompanyProfile,
) -> String {
    let intent = topic.intent.as_deref().unwrap_or("informational");
    let prompt = format!(
        "You are an expert SEO content strategist and editor.
Create a detailed, structured writing guideline for the blog topic below.
Return the guideline as plain text (not JSON). Make it concise but actionable.

TOPIC:
Title: {title}
Primary Keyword: {keyword}
Long-tail Keywords: {long_tail}
Intent: {intent}

COMPANY PROFILE:
{profile}

Guideline must include (clearly labelled sections):
- Suggested final blog title
- Meta description (<= 155 characters)
- Target audience
- Tone & voice
- Target word count
- H1, H2 (4-7 headings), with 1-3 bullet points under each H2 describing what to cover
- Suggested CTAs
- SEO notes: primary+long-tail placement advice, LSI ideas, keyword density target
",
        title = topic.title,
        keyword = topic.keyword,
        long_tail = topic.long_tail_keywords.join(", "),
        profile = profile.to_prompt_json(),
    );

    match generator.complete(SYSTEM, &prompt).await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!("guideline generation failed for '{}': {}", topic.title, e);
            String::new()
        }
    }
}
