use crate::content::{self, CompanyProfile, GeneratedImage, ImagePrompt, Topic};
use crate::generation::{ImageGenerator, TextGenerator};
use crate::tracker::ContentStages;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Production stages: every call goes to the configured generation backend.
pub struct Studio {
    text: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageGenerator>,
    base_url: String,
    image_prompt: ImagePrompt,
    image_delay: Duration,
}

impl Studio {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            text,
            images,
            base_url: base_url.into(),
            image_prompt: ImagePrompt::default(),
            image_delay: Duration::ZERO,
        }
    }

    pub fn with_image_prompt(mut self, prompt: ImagePrompt) -> Self {
        self.image_prompt = prompt;
        self
    }

    pub fn with_image_delay(mut self, delay: Duration) -> Self {
        self.image_delay = delay;
        self
    }
}

#[async_trait]
impl ContentStages for Studio {
    async fn propose_topics(
        &self,
        profile: &CompanyProfile,
        known_titles: &[String],
        count: usize,
    ) -> anyhow::Result<Vec<Topic>> {
        Ok(content::propose_topics(
            self.text.as_ref(),
            profile,
            &self.base_url,
            known_titles,
            count,
        )
        .await)
    }

    async fn expand_guideline(
        &self,
        topic: &Topic,
        profile: &CompanyProfile,
    ) -> anyhow::Result<String> {
        Ok(content::expand_guideline(self.text.as_ref(), topic, profile).await)
    }

    async fn draft_article(
        &self,
        topic: &Topic,
        guideline: &str,
        profile: &CompanyProfile,
    ) -> anyhow::Result<String> {
        Ok(content::draft_article(
            self.text.as_ref(),
            topic,
            guideline,
            profile,
            Some(&self.base_url),
        )
        .await)
    }

    async fn generate_images(
        &self,
        title: &str,
        article: &str,
        count: usize,
    ) -> anyhow::Result<Vec<GeneratedImage>> {
        Ok(content::generate_images(
            self.images.as_ref(),
            &self.image_prompt,
            title,
            article,
            count,
            self.image_delay,
        )
        .await)
    }
}
