use crate::site::fetcher::Fetcher;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, instrument, warn};
use url::Url;

/// Up to `limit` same-site links found on the page at `base_url`.
///
/// Returns an empty list when the page cannot be fetched.
#[instrument(skip(fetcher))]
pub async fn crawl_links(fetcher: &Fetcher, base_url: &str, limit: usize) -> Vec<String> {
    let page = match fetcher.fetch(base_url).await {
        Ok(page) => page,
        Err(e) => {
            warn!("crawl failed for {}: {}", base_url, e);
            return Vec::new();
        }
    };

    let links = same_site_links(&page.html, &page.url, limit);
    debug!("found {} internal links on {}", links.len(), page.url);
    links
}

/// Resolve every `a[href]` against `base`, keeping http(s) links on the same
/// host or one of its subdomains, deduplicated in discovery order.
pub fn same_site_links(html: &str, base: &Url, limit: usize) -> Vec<String> {
    let Some(host) = base.host_str().map(site_host) else {
        return Vec::new();
    };
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        if links.len() >= limit {
            break;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(mut resolved) = base.join(href.trim()) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        let Some(link_host) = resolved.host_str().map(site_host) else {
            continue;
        };
        if link_host != host && !link_host.ends_with(&format!(".{host}")) {
            continue;
        }
        resolved.set_fragment(None);
        let link = resolved.to_string();
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}

fn site_host(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}
