//! One full pass for a site: profile, then tracker resume.

use crate::config::Config;
use crate::content::{CompanyProfile, ImagePrompt, Studio, summarize_company};
use crate::generation::{AzureOpenAi, TextGenerator};
use crate::site::{Fetcher, HomepageInfo, crawl_links, detect_language, extract_homepage, extract_text};
use crate::store::SiteStore;
use crate::tracker::{RunReport, TrackerConfig, WorkTracker};
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Parse user input as a site URL, assuming `https://` when no scheme is
/// given.
pub fn normalize_url(input: &str) -> Result<Url> {
    let input = input.trim();
    if input.is_empty() {
        bail!("no URL provided");
    }
    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{input}")
    };
    let url = Url::parse(&candidate).with_context(|| format!("invalid URL: {input}"))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => bail!("unsupported URL: {input}"),
    }
}

/// Text handed to the profile summarizer.
pub fn site_text(homepage: &HomepageInfo, pages: &[String]) -> String {
    let mut text = format!(
        "WEBSITE TITLE: {}\nMETA DESCRIPTION: {}\nHEADINGS: {}\n",
        homepage.title,
        homepage.meta_description,
        homepage.headings.join(", ")
    );
    let body = pages.join("\n\n");
    if let Some(language) = detect_language(&body) {
        text.push_str(&format!("DETECTED LANGUAGE: {language}\n"));
    }
    text.push('\n');
    text.push_str(&body);
    text
}

/// Crawl the site and summarize it into a profile.
#[instrument(skip(config, generator), fields(site = %base))]
pub async fn build_profile(
    config: &Config,
    generator: &dyn TextGenerator,
    base: &Url,
) -> Result<Option<CompanyProfile>> {
    let fetcher = Fetcher::new()?;

    info!("crawling homepage for internal links");
    let mut links = crawl_links(&fetcher, base.as_str(), config.crawl_limit()).await;
    info!("found {} links", links.len());
    if links.is_empty() {
        links.push(base.to_string());
    }

    let homepage = extract_homepage(&fetcher, base.as_str()).await;

    let mut pages = Vec::with_capacity(links.len());
    for (i, link) in links.iter().enumerate() {
        let text = extract_text(&fetcher, link).await;
        if !text.is_empty() {
            pages.push(text);
        }
        if i + 1 < links.len() && !config.crawl_delay().is_zero() {
            sleep(config.crawl_delay()).await;
        }
    }
    info!("extracted text from {} of {} pages", pages.len(), links.len());

    let text = site_text(&homepage, &pages);
    Ok(summarize_company(generator, &text, base.as_str()).await)
}

/// The persisted profile unless a refresh is requested or none is usable;
/// otherwise a freshly built and saved one. A saved `raw_output` placeholder
/// is never reused.
async fn company_profile(
    config: &Config,
    store: &SiteStore,
    generator: &dyn TextGenerator,
    base: &Url,
) -> Result<CompanyProfile> {
    let path = store.profile_path();
    if !config.refresh_profile() {
        match store.read_json::<CompanyProfile>(&path) {
            Ok(Some(profile)) if !profile.is_empty() && !profile.is_unparsed() => {
                info!("using saved company profile {}", path.display());
                return Ok(profile);
            }
            Ok(Some(profile)) if profile.is_unparsed() => {
                info!("saved company profile {} is unparsed; summarizing again", path.display())
            }
            Ok(_) => {}
            Err(e) => warn!("rebuilding company profile: {}", e),
        }
    }

    let Some(profile) = build_profile(config, generator, base).await? else {
        error!("company profile generation failed for {}", base);
        bail!("company profile generation failed for {base}");
    };
    if profile.is_unparsed() {
        warn!("company profile response was not valid JSON; keeping raw text");
    }
    store.write_json(&path, &profile)?;
    info!("saved company profile {}", path.display());
    Ok(profile)
}

/// Run one resume pass for the site at `input`.
pub async fn run_site(config: &Config, input: &str) -> Result<RunReport> {
    let base = normalize_url(input)?;
    let store = SiteStore::for_url(config.output_dir(), &base);
    let backend = Arc::new(AzureOpenAi::new(config)?);

    let profile = company_profile(config, &store, backend.as_ref(), &base).await?;

    let studio = Studio::new(backend.clone(), backend, base.as_str())
        .with_image_prompt(ImagePrompt::load(config.image_prompt_path()))
        .with_image_delay(config.image_delay());
    let tracker = WorkTracker::new(store, studio, TrackerConfig::from_config(config));
    let report = tracker.resume(&profile).await?;
    Ok(report)
}
