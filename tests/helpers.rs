#![allow(dead_code)]

use async_trait::async_trait;
use blogforge::content::{CompanyProfile, GeneratedImage, Topic};
use blogforge::store::SiteStore;
use blogforge::tracker::{ContentStages, TrackerConfig, WorkTracker};
use bytes::Bytes;
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub const SITE: &str = "sunny.test";

/// What the fake stages return and what they were asked.
#[derive(Default)]
pub struct Script {
    pub proposals: VecDeque<Vec<Topic>>,
    pub empty_guidelines: HashSet<String>,
    pub failing_articles: HashSet<String>,
    pub failing_images: HashSet<String>,
    pub no_images: bool,

    pub proposal_calls: Vec<Vec<String>>,
    pub guideline_calls: Vec<String>,
    /// (title, guideline text received)
    pub article_calls: Vec<(String, String)>,
    /// (title, article text received)
    pub image_calls: Vec<(String, String)>,
}

/// Scripted `ContentStages`; clones share one script.
#[derive(Clone, Default)]
pub struct ScriptedStages {
    script: Arc<Mutex<Script>>,
}

impl ScriptedStages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn propose(&self, titles: &[&str]) -> &Self {
        self.script()
            .proposals
            .push_back(titles.iter().map(|t| Topic::new(*t, t.to_lowercase())).collect());
        self
    }

    pub fn empty_guideline_for(&self, title: &str) -> &Self {
        self.script().empty_guidelines.insert(title.to_string());
        self
    }

    pub fn failing_article_for(&self, title: &str) -> &Self {
        self.script().failing_articles.insert(title.to_string());
        self
    }

    pub fn failing_images_for(&self, title: &str) -> &Self {
        self.script().failing_images.insert(title.to_string());
        self
    }

    pub fn heal(&self) {
        let mut script = self.script();
        script.empty_guidelines.clear();
        script.failing_articles.clear();
    }
}

pub fn guideline_for(title: &str) -> String {
    format!("GUIDELINE for {title}")
}

pub fn article_for(title: &str) -> String {
    format!("<!-- META_TITLE: {title} -->\n<!-- META_DESC: About {title}. -->\n\n# {title}\n\nBody.\n")
}

#[async_trait]
impl ContentStages for ScriptedStages {
    async fn propose_topics(
        &self,
        _profile: &CompanyProfile,
        known_titles: &[String],
        _count: usize,
    ) -> anyhow::Result<Vec<Topic>> {
        let mut script = self.script();
        script.proposal_calls.push(known_titles.to_vec());
        Ok(script.proposals.pop_front().unwrap_or_default())
    }

    async fn expand_guideline(
        &self,
        topic: &Topic,
        _profile: &CompanyProfile,
    ) -> anyhow::Result<String> {
        let mut script = self.script();
        script.guideline_calls.push(topic.title.clone());
        if script.empty_guidelines.contains(&topic.title) {
            return Ok(String::new());
        }
        Ok(guideline_for(&topic.title))
    }

    async fn draft_article(
        &self,
        topic: &Topic,
        guideline: &str,
        _profile: &CompanyProfile,
    ) -> anyhow::Result<String> {
        let mut script = self.script();
        script
            .article_calls
            .push((topic.title.clone(), guideline.to_string()));
        if script.failing_articles.contains(&topic.title) {
            anyhow::bail!("backend unavailable");
        }
        Ok(article_for(&topic.title))
    }

    async fn generate_images(
        &self,
        title: &str,
        article: &str,
        count: usize,
    ) -> anyhow::Result<Vec<GeneratedImage>> {
        let mut script = self.script();
        script
            .image_calls
            .push((title.to_string(), article.to_string()));
        if script.failing_images.contains(title) {
            anyhow::bail!("image backend exploded");
        }
        if script.no_images {
            return Ok(Vec::new());
        }
        Ok((1..=count)
            .map(|index| GeneratedImage {
                index,
                bytes: Bytes::from_static(b"\x89PNG"),
            })
            .collect())
    }
}

pub fn tracker(root: &Path, stages: &ScriptedStages) -> WorkTracker<ScriptedStages> {
    WorkTracker::new(
        SiteStore::new(root, SITE),
        stages.clone(),
        TrackerConfig {
            batch_size: 2,
            image_count: 2,
            stage_delay: Duration::ZERO,
        },
    )
}

pub fn profile() -> CompanyProfile {
    CompanyProfile {
        company_name: "Sunny Rooftops".into(),
        industry: "Solar installation".into(),
        ..CompanyProfile::default()
    }
}
