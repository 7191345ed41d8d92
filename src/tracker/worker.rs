use crate::config::Config;
use crate::content::{ArticleMeta, CompanyProfile, Topic, parse_topics};
use crate::store::{MAX_SLUG_LENGTH, SiteStore, StoreError, safe_slug};
use crate::tracker::{ContentStages, RunReport, TrackerState, WorkItem};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{Span, debug, info, instrument, warn};

/// Tracker configuration
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Topics requested per proposal round.
    pub batch_size: usize,
    pub image_count: usize,
    /// Pause after each completed stage.
    pub stage_delay: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            batch_size: 2,
            image_count: 4,
            stage_delay: Duration::ZERO,
        }
    }
}

impl TrackerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size(),
            image_count: config.image_count(),
            stage_delay: config.stage_delay(),
        }
    }
}

/// Drives every tracked topic of one site through guideline, article and
/// images, persisting state after each stage.
pub struct WorkTracker<S> {
    store: SiteStore,
    stages: S,
    config: TrackerConfig,
}

impl<S: ContentStages> WorkTracker<S> {
    pub fn new(store: SiteStore, stages: S, config: TrackerConfig) -> Self {
        Self {
            store,
            stages,
            config,
        }
    }

    pub fn store(&self) -> &SiteStore {
        &self.store
    }

    /// Persisted state, or an empty one when none exists yet.
    pub fn load(&self) -> Result<TrackerState, StoreError> {
        Ok(self
            .store
            .read_json::<TrackerState>(&self.store.state_path())?
            .unwrap_or_default())
    }

    fn persist(&self, state: &TrackerState) -> Result<(), StoreError> {
        self.store.write_json(&self.store.state_path(), state)
    }

    /// One resume pass.
    ///
    /// Finishes every incomplete item first. New topics are proposed only
    /// when nothing is left incomplete, and are then advanced in the same
    /// pass. Stage failures are logged and counted; only a failure to read
    /// or persist the state itself is returned as an error.
    #[instrument(skip_all, fields(site = %self.store.site()))]
    pub async fn resume(&self, profile: &CompanyProfile) -> Result<RunReport, StoreError> {
        let mut report = RunReport::default();
        let mut state = self.load()?;

        if state.is_empty() {
            report.seeded = self.seed_from_legacy(&mut state)?;
        }

        let pending = state.incomplete();
        if !pending.is_empty() {
            info!("resuming {} incomplete topics", pending.len());
        }
        for idx in pending {
            self.advance(&mut state, idx, profile, &mut report).await?;
        }

        let remaining = state.incomplete().len();
        if remaining == 0 {
            for idx in self.propose(&mut state, profile, &mut report).await? {
                self.advance(&mut state, idx, profile, &mut report).await?;
            }
        } else {
            info!("{} topics still incomplete; skipping topic proposal", remaining);
        }

        report.total = state.len();
        report.incomplete = state.incomplete().len();
        info!("{}", report);
        Ok(report)
    }

    fn seed_from_legacy(&self, state: &mut TrackerState) -> Result<usize, StoreError> {
        let path = self.store.legacy_topics_path();
        let legacy = match self.store.read_json::<Value>(&path) {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(0),
            Err(e) => {
                warn!("ignoring unreadable legacy topics: {}", e);
                return Ok(0);
            }
        };

        let seeded = parse_topics(legacy)
            .into_iter()
            .filter_map(|topic| state.push(topic))
            .count();
        if seeded > 0 {
            info!("seeded {} topics from {}", seeded, path.display());
            self.persist(state)?;
        }
        Ok(seeded)
    }

    /// Append up to `batch_size` proposed topics that are not tracked yet.
    async fn propose(
        &self,
        state: &mut TrackerState,
        profile: &CompanyProfile,
        report: &mut RunReport,
    ) -> Result<Vec<usize>, StoreError> {
        let known = state.normalized_titles();
        let proposals = match self
            .stages
            .propose_topics(profile, &known, self.config.batch_size)
            .await
        {
            Ok(topics) => topics,
            Err(e) => {
                warn!("topic proposal failed: {:#}", e);
                report.failures += 1;
                return Ok(Vec::new());
            }
        };

        let offered = proposals.len();
        let added: Vec<usize> = proposals
            .into_iter()
            .filter_map(|topic| state.push(topic))
            .take(self.config.batch_size)
            .collect();

        if added.is_empty() {
            warn!("no new topics from {} proposals", offered);
        } else {
            info!("added {} new topics ({} proposed)", added.len(), offered);
            self.persist(state)?;
        }
        report.proposed = added.len();
        Ok(added)
    }

    /// Run every outstanding stage of one item, stopping at the first stage
    /// that does not complete.
    #[instrument(skip_all, fields(title = tracing::field::Empty))]
    async fn advance(
        &self,
        state: &mut TrackerState,
        idx: usize,
        profile: &CompanyProfile,
        report: &mut RunReport,
    ) -> Result<(), StoreError> {
        let Some(item) = state.get(idx) else {
            return Ok(());
        };
        Span::current().record("title", item.title());
        debug!(
            "advancing '{}' (guideline={}, article={}, images={})",
            item.title(),
            item.guideline_done,
            item.article_done,
            item.images_done
        );

        if !item.guideline_done && !self.guideline_stage(state, idx, profile, report).await? {
            return Ok(());
        }
        if !self.snapshot(state, idx).article_done
            && !self.article_stage(state, idx, profile, report).await?
        {
            return Ok(());
        }
        if !self.snapshot(state, idx).images_done {
            self.images_stage(state, idx, profile, report).await?;
        }
        Ok(())
    }

    async fn guideline_stage(
        &self,
        state: &mut TrackerState,
        idx: usize,
        profile: &CompanyProfile,
        report: &mut RunReport,
    ) -> Result<bool, StoreError> {
        let item = self.snapshot(state, idx);
        let Some(text) = self.generate_guideline(&item.topic, profile).await else {
            report.failures += 1;
            return Ok(false);
        };
        let rel = self.store.guideline_rel(&stem_of(&item));
        if !self.save_text(&rel, &text) {
            report.failures += 1;
            return Ok(false);
        }

        update(state, idx, |i| {
            i.guideline_done = true;
            i.guideline_path = Some(rel);
        });
        self.persist(state)?;
        report.guidelines += 1;
        info!("guideline done for '{}'", item.title());
        self.pause().await;
        Ok(true)
    }

    async fn article_stage(
        &self,
        state: &mut TrackerState,
        idx: usize,
        profile: &CompanyProfile,
        report: &mut RunReport,
    ) -> Result<bool, StoreError> {
        let item = self.snapshot(state, idx);
        let Some(guideline) = self.guideline_text(state, idx, profile).await? else {
            warn!("no guideline text for '{}'; article deferred", item.title());
            report.failures += 1;
            return Ok(false);
        };
        let Some(article) = self.generate_article(&item.topic, &guideline, profile).await else {
            report.failures += 1;
            return Ok(false);
        };
        let rel = self.store.article_rel(&stem_of(&item));
        if !self.save_text(&rel, &article) {
            report.failures += 1;
            return Ok(false);
        }

        update(state, idx, |i| {
            i.article_done = true;
            i.article_path = Some(rel);
        });
        self.persist(state)?;
        report.articles += 1;
        info!("article done for '{}'", item.title());
        self.pause().await;
        Ok(true)
    }

    /// Closes the stage on any generator outcome, including zero images.
    /// Only a missing article leaves the flag unset.
    async fn images_stage(
        &self,
        state: &mut TrackerState,
        idx: usize,
        profile: &CompanyProfile,
        report: &mut RunReport,
    ) -> Result<bool, StoreError> {
        let item = self.snapshot(state, idx);
        let Some(article) = self.article_text(state, idx, profile).await? else {
            warn!("no article text for '{}'; images deferred", item.title());
            report.failures += 1;
            return Ok(false);
        };
        let title = ArticleMeta::parse(&article)
            .map(|meta| meta.title)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| item.title().to_string());

        let images = match self
            .stages
            .generate_images(&title, &article, self.config.image_count)
            .await
        {
            Ok(images) => images,
            Err(e) => {
                warn!("image generation failed for '{}': {:#}", item.title(), e);
                report.failures += 1;
                Vec::new()
            }
        };

        let stem = stem_of(&item);
        let mut saved = Vec::with_capacity(images.len());
        for image in images {
            let rel = self.store.image_rel(&stem, image.index);
            match self.store.write_bytes(&self.store.resolve(&rel), &image.bytes) {
                Ok(()) => saved.push(rel),
                Err(e) => warn!("{}", e),
            }
        }
        if saved.is_empty() {
            warn!("no images saved for '{}'; closing stage anyway", item.title());
        }

        update(state, idx, |i| {
            i.images_done = true;
            i.images = saved;
        });
        self.persist(state)?;
        report.images += 1;
        info!("images done for '{}'", item.title());
        self.pause().await;
        Ok(true)
    }

    /// Guideline text from disk, regenerated and written back when the
    /// artifact is missing or blank.
    async fn guideline_text(
        &self,
        state: &mut TrackerState,
        idx: usize,
        profile: &CompanyProfile,
    ) -> Result<Option<String>, StoreError> {
        let item = self.snapshot(state, idx);
        if let Some(text) = self.read_artifact(item.guideline_path.as_deref()) {
            return Ok(Some(text));
        }
        warn!("guideline for '{}' missing on disk; regenerating", item.title());
        let Some(text) = self.generate_guideline(&item.topic, profile).await else {
            return Ok(None);
        };
        let rel = item
            .guideline_path
            .clone()
            .unwrap_or_else(|| self.store.guideline_rel(&stem_of(&item)));
        if self.save_text(&rel, &text) && item.guideline_path.is_none() {
            update(state, idx, |i| i.guideline_path = Some(rel));
            self.persist(state)?;
        }
        Ok(Some(text))
    }

    /// Article text from disk, regenerated from the guideline and written
    /// back when the artifact is missing or blank.
    async fn article_text(
        &self,
        state: &mut TrackerState,
        idx: usize,
        profile: &CompanyProfile,
    ) -> Result<Option<String>, StoreError> {
        let item = self.snapshot(state, idx);
        if let Some(text) = self.read_artifact(item.article_path.as_deref()) {
            return Ok(Some(text));
        }
        warn!("article for '{}' missing on disk; regenerating", item.title());
        let Some(guideline) = self.guideline_text(state, idx, profile).await? else {
            return Ok(None);
        };
        let Some(article) = self.generate_article(&item.topic, &guideline, profile).await else {
            return Ok(None);
        };
        let rel = item
            .article_path
            .clone()
            .unwrap_or_else(|| self.store.article_rel(&stem_of(&item)));
        if self.save_text(&rel, &article) && item.article_path.is_none() {
            update(state, idx, |i| i.article_path = Some(rel));
            self.persist(state)?;
        }
        Ok(Some(article))
    }

    async fn generate_guideline(&self, topic: &Topic, profile: &CompanyProfile) -> Option<String> {
        match self.stages.expand_guideline(topic, profile).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                warn!("empty guideline for '{}'; will retry next run", topic.title);
                None
            }
            Err(e) => {
                warn!("guideline failed for '{}': {:#}", topic.title, e);
                None
            }
        }
    }

    async fn generate_article(
        &self,
        topic: &Topic,
        guideline: &str,
        profile: &CompanyProfile,
    ) -> Option<String> {
        match self.stages.draft_article(topic, guideline, profile).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                warn!("empty article for '{}'; will retry next run", topic.title);
                None
            }
            Err(e) => {
                warn!("article failed for '{}': {:#}", topic.title, e);
                None
            }
        }
    }

    fn read_artifact(&self, rel: Option<&Path>) -> Option<String> {
        let path = self.store.resolve(rel?);
        match self.store.read_text(&path) {
            Ok(Some(text)) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    fn save_text(&self, rel: &Path, text: &str) -> bool {
        match self.store.write_text(&self.store.resolve(rel), text) {
            Ok(()) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    fn snapshot(&self, state: &TrackerState, idx: usize) -> WorkItem {
        state
            .get(idx)
            .cloned()
            .unwrap_or_else(|| WorkItem::new(Topic::default()))
    }

    async fn pause(&self) {
        if !self.config.stage_delay.is_zero() {
            sleep(self.config.stage_delay).await;
        }
    }
}

fn update(state: &mut TrackerState, idx: usize, f: impl FnOnce(&mut WorkItem)) {
    if let Some(item) = state.get_mut(idx) {
        f(item);
        item.touch();
    }
}

fn stem_of(item: &WorkItem) -> String {
    item.stem
        .clone()
        .unwrap_or_else(|| safe_slug(&item.normalized_title(), MAX_SLUG_LENGTH))
}
