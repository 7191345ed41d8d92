use crate::content::{CompanyProfile, GeneratedImage, Topic};
use async_trait::async_trait;

/// The generation stages the work tracker drives.
///
/// Implementations are stateless with respect to the tracker: they return
/// text or images and never touch persisted state. An `Err` and an empty
/// result are treated the same way by the tracker.
#[async_trait]
pub trait ContentStages: Send + Sync {
    /// Up to `count` topics that do not repeat any of `known_titles`.
    async fn propose_topics(
        &self,
        profile: &CompanyProfile,
        known_titles: &[String],
        count: usize,
    ) -> anyhow::Result<Vec<Topic>>;

    async fn expand_guideline(
        &self,
        topic: &Topic,
        profile: &CompanyProfile,
    ) -> anyhow::Result<String>;

    async fn draft_article(
        &self,
        topic: &Topic,
        guideline: &str,
        profile: &CompanyProfile,
    ) -> anyhow::Result<String>;

    async fn generate_images(
        &self,
        title: &str,
        article: &str,
        count: usize,
    ) -> anyhow::Result<Vec<GeneratedImage>>;
}
