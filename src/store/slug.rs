use regex::Regex;
use std::sync::LazyLock;

pub const MAX_SLUG_LENGTH: usize = 80;

static DISALLOWED_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());
static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Lowercase underscore slug: `&` becomes `and`, anything outside
/// `[a-z0-9 -]` is dropped, whitespace runs become `_`. Never empty.
pub fn safe_slug(text: &str, max_length: usize) -> String {
    let lower = text.trim().to_lowercase().replace('&', "and");
    let kept = DISALLOWED_REGEX.replace_all(&lower, "");
    let joined = WHITESPACE_REGEX.replace_all(kept.trim(), "_");
    // only ASCII is left, so byte slicing is safe
    let cut = &joined[..joined.len().min(max_length)];
    let slug = cut.trim_matches('_');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// File stem for a topic's artifacts. When the plain slug is already `taken`
/// by another topic, a short hash of the normalized title is appended.
pub fn artifact_stem(normalized_title: &str, taken: impl Fn(&str) -> bool) -> String {
    let slug = safe_slug(normalized_title, MAX_SLUG_LENGTH);
    if !taken(&slug) {
        return slug;
    }
    let digest = format!("{:x}", md5::compute(normalized_title.as_bytes()));
    format!("{}_{}", slug, &digest[..8])
}
