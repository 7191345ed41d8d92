//! Stateless generation stages.
//!
//! Each function wraps exactly one kind of backend call and returns an empty
//! value instead of an error; callers decide what an empty result means.

pub mod article;
pub mod guideline;
pub mod illustration;
pub mod json;
pub mod lenient;
pub mod profile;
pub mod studio;
pub mod topics;

pub use article::{ArticleMeta, draft_article, finalize_article};
pub use guideline::expand_guideline;
pub use illustration::{GeneratedImage, ImagePrompt, generate_images};
pub use json::parse_structured;
pub use profile::{CompanyProfile, summarize_company};
pub use studio::Studio;
pub use topics::{Topic, normalize_title, parse_topics, propose_topics};

/// At most `max` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
