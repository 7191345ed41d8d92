use crate::site::{boilerplate, fetcher::Fetcher};
use readability::extractor;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{instrument, warn};
use url::Url;

static SPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const BLOCK_SELECTOR: &str = "p, li, h1, h2, h3, h4, h5, h6, blockquote, td, dd";

/// Title, meta description and top-level headings of a homepage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomepageInfo {
    pub title: String,
    pub meta_description: String,
    pub headings: Vec<String>,
}

#[instrument(skip(fetcher))]
pub async fn extract_homepage(fetcher: &Fetcher, url: &str) -> HomepageInfo {
    match fetcher.fetch(url).await {
        Ok(page) => homepage_info(&page.html),
        Err(e) => {
            warn!("homepage extraction failed for {}: {}", url, e);
            HomepageInfo::default()
        }
    }
}

pub fn homepage_info(html: &str) -> HomepageInfo {
    let document = Html::parse_document(html);

    let title = first_text(&document, "title").unwrap_or_default();
    let meta_description = Selector::parse(r#"meta[name="description"]"#)
        .ok()
        .and_then(|s| {
            document
                .select(&s)
                .find_map(|el| el.value().attr("content"))
                .map(|c| c.trim().to_string())
        })
        .unwrap_or_default();
    let headings = Selector::parse("h1")
        .map(|s| {
            document
                .select(&s)
                .map(|el| collapse(&el.text().collect::<String>()))
                .filter(|h| !h.is_empty())
                .collect()
        })
        .unwrap_or_default();

    HomepageInfo {
        title,
        meta_description,
        headings,
    }
}

/// Readable prose of the page at `url` with navigation and template lines
/// removed. Empty when the page cannot be fetched or holds nothing useful.
#[instrument(skip(fetcher))]
pub async fn extract_text(fetcher: &Fetcher, url: &str) -> String {
    match fetcher.fetch(url).await {
        Ok(page) => readable_text(&page.html, &page.url),
        Err(e) => {
            warn!("text extraction failed for {}: {}", url, e);
            String::new()
        }
    }
}

pub fn readable_text(html: &str, url: &Url) -> String {
    let lines = match extractor::extract(&mut html.as_bytes(), url) {
        Ok(article) => {
            let lines = block_lines(&article.content);
            if lines.is_empty() {
                article.text.lines().map(collapse).collect()
            } else {
                lines
            }
        }
        Err(_) => fallback_lines(html),
    };
    boilerplate::filter_lines(lines)
}

fn block_lines(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    let Ok(selector) = Selector::parse(BLOCK_SELECTOR) else {
        return Vec::new();
    };
    fragment
        .select(&selector)
        .map(|el| collapse(&el.text().collect::<String>()))
        .filter(|line| !line.is_empty())
        .collect()
}

fn fallback_lines(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    for candidate in ["article", "main", "[role='main']", "#content", ".content", "body"] {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        if let Some(root) = document.select(&selector).next() {
            let lines = block_lines(&root.inner_html());
            if !lines.is_empty() {
                return lines;
            }
        }
    }
    Vec::new()
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(|el| collapse(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
}

fn collapse(text: &str) -> String {
    SPACE_REGEX.replace_all(text.trim(), " ").into_owned()
}
