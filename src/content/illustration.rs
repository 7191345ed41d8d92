use crate::content::truncate_chars;
use crate::generation::ImageGenerator;
use bytes::Bytes;
use rand::Rng;
use rand::seq::SliceRandom;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument, warn};

const ARTICLE_CONTEXT: usize = 1200;

const DEFAULT_TEMPLATE: &str = "Photorealistic editorial photograph illustrating a blog post titled \"{title}\". \
Scene: {scene}, {time_of_day} light. Natural colours, real people and places, \
no text overlays, no watermarks.";

const TIMES_OF_DAY: [&str; 3] = ["morning", "evening", "golden hour"];
const SCENES: [&str; 4] = [
    "the product or service from the article in everyday use",
    "a professional at work with a customer",
    "a close-up detail that captures the article's main idea",
    "a wide establishing shot of the place the article describes",
];

/// Fixed fillers for the older scene-description placeholders.
const SCENE_DETAILS: [(&str, &str); 4] = [
    ("{location_detail}", "the setting the article describes"),
    ("{examples_of_setting}", "everyday surroundings typical of that place"),
    ("{human_activity}", "people engaged with the article's subject"),
    ("{extra_elements}", "small natural details in the background"),
];

/// One generated image, in generation order starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub index: usize,
    pub bytes: Bytes,
}

/// Prompt template.
///
/// Placeholders: `{title}`, `{scene}` (alias `{scene_type}`), `{time_of_day}`,
/// `{location_detail}`, `{examples_of_setting}`, `{human_activity}` and
/// `{extra_elements}`. Any other braces are sent as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePrompt {
    template: String,
}

impl Default for ImagePrompt {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl ImagePrompt {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Template from `path`, or the built-in one when no path is given or the
    /// file cannot be read.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match std::fs::read_to_string(path) {
            Ok(template) if !template.trim().is_empty() => Self::new(template.trim()),
            Ok(_) => Self::default(),
            Err(e) => {
                warn!("cannot read image prompt {}: {}; using default", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn render<R: Rng + ?Sized>(&self, title: &str, article: &str, rng: &mut R) -> String {
        let chosen = SCENES.choose(rng).copied().unwrap_or(SCENES[0]);
        let mut scene = self
            .template
            .replace("{title}", title)
            .replace("{scene}", chosen)
            .replace("{scene_type}", chosen)
            .replace(
                "{time_of_day}",
                TIMES_OF_DAY.choose(rng).copied().unwrap_or(TIMES_OF_DAY[0]),
            );
        for (placeholder, detail) in SCENE_DETAILS {
            scene = scene.replace(placeholder, detail);
        }
        format!(
            "Blog context:\n{}\n\nScene:\n{}",
            truncate_chars(article, ARTICLE_CONTEXT),
            scene
        )
    }
}

/// Generate up to `count` images for an article, one request at a time.
///
/// Failed images are logged and skipped, so the result may be shorter than
/// `count` or empty.
#[instrument(skip(generator, prompt, article, delay))]
pub async fn generate_images(
    generator: &dyn ImageGenerator,
    prompt: &ImagePrompt,
    title: &str,
    article: &str,
    count: usize,
    delay: Duration,
) -> Vec<GeneratedImage> {
    let mut images = Vec::with_capacity(count);
    for index in 1..=count {
        // ThreadRng is not Send; keep it out of the await below
        let rendered = prompt.render(title, article, &mut rand::thread_rng());
        match generator.generate_image(&rendered).await {
            Ok(bytes) => {
                info!("generated image {}/{} for '{}'", index, count, title);
                images.push(GeneratedImage { index, bytes });
            }
            Err(e) => warn!("image {}/{} for '{}' failed: {}", index, count, title, e),
        }
        if index < count && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    images
}
