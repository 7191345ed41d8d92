//! Generative text and image backend.
//!
//! The rest of the crate only sees the two traits below; `AzureOpenAi` is the
//! production implementation of both.

pub mod azure;
pub mod backoff;
pub mod errors;

pub use azure::AzureOpenAi;
pub use backoff::backoff_delay;
pub use errors::GenerationError;

use async_trait::async_trait;
use bytes::Bytes;

/// Chat-style text completion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `user` under the `system` instruction. Never returns an empty
    /// string; an empty completion is `GenerationError::EmptyResponse`.
    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError>;
}

/// Single image generation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Encoded image bytes for `prompt`.
    async fn generate_image(&self, prompt: &str) -> Result<Bytes, GenerationError>;
}
