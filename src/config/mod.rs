//! Runtime configuration.
//!
//! `Config::from_env` is called once by the binary and the resulting value is
//! handed to every component that needs it. Nothing else in the crate reads
//! the environment.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const ENV_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_API_VERSION: &str = "AZURE_API_VERSION";
pub const ENV_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const ENV_IMAGE_ENDPOINT: &str = "AZURE_IMAGE_ENDPOINT";
pub const ENV_IMAGE_API_KEY: &str = "AZURE_IMAGE_API_KEY";
pub const ENV_IMAGE_API_VERSION: &str = "AZURE_IMAGE_API_VERSION";
pub const ENV_IMAGE_DEPLOYMENT: &str = "AZURE_IMAGE_DEPLOYMENT";
pub const ENV_IMAGE_SIZE: &str = "BLOGFORGE_IMAGE_SIZE";
pub const ENV_OUTPUT_DIR: &str = "BLOGFORGE_OUTPUT_DIR";
pub const ENV_BATCH_SIZE: &str = "BLOGFORGE_BATCH_SIZE";
pub const ENV_IMAGE_COUNT: &str = "BLOGFORGE_IMAGE_COUNT";
pub const ENV_CRAWL_LIMIT: &str = "BLOGFORGE_CRAWL_LIMIT";
pub const ENV_STAGE_DELAY_MS: &str = "BLOGFORGE_STAGE_DELAY_MS";
pub const ENV_CRAWL_DELAY_MS: &str = "BLOGFORGE_CRAWL_DELAY_MS";
pub const ENV_IMAGE_DELAY_MS: &str = "BLOGFORGE_IMAGE_DELAY_MS";
pub const ENV_MAX_RETRIES: &str = "BLOGFORGE_MAX_RETRIES";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "BLOGFORGE_REQUEST_TIMEOUT_SECS";
pub const ENV_REFRESH_PROFILE: &str = "BLOGFORGE_REFRESH_PROFILE";
/// Path to an image prompt template; see `content::ImagePrompt` for placeholders.
pub const ENV_IMAGE_PROMPT: &str = "BLOGFORGE_IMAGE_PROMPT";

const DEFAULT_API_VERSION: &str = "2024-02-01";
const DEFAULT_DEPLOYMENT: &str = "gpt-4o-mini";
const DEFAULT_IMAGE_DEPLOYMENT: &str = "dall-e-3";
const DEFAULT_IMAGE_SIZE: &str = "1792x1024";
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_BATCH_SIZE: usize = 2;
const DEFAULT_IMAGE_COUNT: usize = 4;
const DEFAULT_CRAWL_LIMIT: usize = 6;
const DEFAULT_STAGE_DELAY_MS: u64 = 500;
const DEFAULT_CRAWL_DELAY_MS: u64 = 200;
const DEFAULT_IMAGE_DELAY_MS: u64 = 2000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Connection settings for one Azure OpenAI deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub deployment: String,
}

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    text: BackendConfig,
    image: BackendConfig,
    image_size: String,
    output_dir: PathBuf,
    batch_size: usize,
    image_count: usize,
    crawl_limit: usize,
    stage_delay: Duration,
    crawl_delay: Duration,
    image_delay: Duration,
    max_retries: u32,
    request_timeout: Duration,
    refresh_profile: bool,
    image_prompt_path: Option<PathBuf>,
}

impl Config {
    /// Build a config for the given text backend with every other knob at
    /// its default. The image backend shares the text credentials.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let text = BackendConfig {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            deployment: DEFAULT_DEPLOYMENT.to_string(),
        };
        let image = BackendConfig {
            deployment: DEFAULT_IMAGE_DEPLOYMENT.to_string(),
            ..text.clone()
        };
        Self {
            text,
            image,
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            batch_size: DEFAULT_BATCH_SIZE,
            image_count: DEFAULT_IMAGE_COUNT,
            crawl_limit: DEFAULT_CRAWL_LIMIT,
            stage_delay: Duration::from_millis(DEFAULT_STAGE_DELAY_MS),
            crawl_delay: Duration::from_millis(DEFAULT_CRAWL_DELAY_MS),
            image_delay: Duration::from_millis(DEFAULT_IMAGE_DELAY_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            refresh_profile: false,
            image_prompt_path: None,
        }
    }

    /// Load from environment variables, falling back to defaults for
    /// everything except the text backend credentials.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = required(ENV_ENDPOINT)?;
        let api_key = required(ENV_API_KEY)?;
        let mut cfg = Self::new(endpoint, api_key);

        if let Some(v) = optional(ENV_API_VERSION) {
            cfg.text.api_version = v;
        }
        if let Some(v) = optional(ENV_DEPLOYMENT) {
            cfg.text.deployment = v;
        }

        cfg.image = BackendConfig {
            endpoint: optional(ENV_IMAGE_ENDPOINT).unwrap_or_else(|| cfg.text.endpoint.clone()),
            api_key: optional(ENV_IMAGE_API_KEY).unwrap_or_else(|| cfg.text.api_key.clone()),
            api_version: optional(ENV_IMAGE_API_VERSION)
                .unwrap_or_else(|| cfg.text.api_version.clone()),
            deployment: optional(ENV_IMAGE_DEPLOYMENT)
                .unwrap_or_else(|| DEFAULT_IMAGE_DEPLOYMENT.to_string()),
        };

        if let Some(v) = optional(ENV_IMAGE_SIZE) {
            cfg.image_size = v;
        }
        if let Some(v) = optional(ENV_OUTPUT_DIR) {
            cfg.output_dir = PathBuf::from(v);
        }
        cfg.batch_size = parsed(ENV_BATCH_SIZE, cfg.batch_size)?;
        cfg.image_count = parsed(ENV_IMAGE_COUNT, cfg.image_count)?;
        cfg.crawl_limit = parsed(ENV_CRAWL_LIMIT, cfg.crawl_limit)?;
        cfg.stage_delay = Duration::from_millis(parsed(ENV_STAGE_DELAY_MS, DEFAULT_STAGE_DELAY_MS)?);
        cfg.crawl_delay = Duration::from_millis(parsed(ENV_CRAWL_DELAY_MS, DEFAULT_CRAWL_DELAY_MS)?);
        cfg.image_delay = Duration::from_millis(parsed(ENV_IMAGE_DELAY_MS, DEFAULT_IMAGE_DELAY_MS)?);
        cfg.max_retries = parsed(ENV_MAX_RETRIES, cfg.max_retries)?;
        cfg.request_timeout =
            Duration::from_secs(parsed(ENV_REQUEST_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS)?);
        cfg.refresh_profile = parsed(ENV_REFRESH_PROFILE, false)?;
        cfg.image_prompt_path = optional(ENV_IMAGE_PROMPT).map(PathBuf::from);

        if cfg.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_BATCH_SIZE,
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(cfg)
    }

    pub fn text_backend(&self) -> &BackendConfig {
        &self.text
    }
    pub fn image_backend(&self) -> &BackendConfig {
        &self.image
    }
    pub fn image_size(&self) -> &str {
        &self.image_size
    }
    /// Root directory for every persisted artifact.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
    /// Number of new topics accepted per proposal round.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
    pub fn image_count(&self) -> usize {
        self.image_count
    }
    pub fn crawl_limit(&self) -> usize {
        self.crawl_limit
    }
    /// Pause after each generation-backed stage.
    pub fn stage_delay(&self) -> Duration {
        self.stage_delay
    }
    pub fn crawl_delay(&self) -> Duration {
        self.crawl_delay
    }
    pub fn image_delay(&self) -> Duration {
        self.image_delay
    }
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
    /// Re-crawl the site even when a company profile is already persisted.
    pub fn refresh_profile(&self) -> bool {
        self.refresh_profile
    }
    pub fn image_prompt_path(&self) -> Option<&Path> {
        self.image_prompt_path.as_deref()
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_image_count(mut self, count: usize) -> Self {
        self.image_count = count;
        self
    }

    /// Zero every courtesy delay. Used by tests and local mocks.
    pub fn without_delays(mut self) -> Self {
        self.stage_delay = Duration::ZERO;
        self.crawl_delay = Duration::ZERO;
        self.image_delay = Duration::ZERO;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing { field: key })
}

fn parsed<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match optional(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            field: key,
            reason: format!("{raw:?}: {e}"),
        }),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    Missing { field: &'static str },
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing { field } => write!(f, "missing required setting '{}'", field),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
