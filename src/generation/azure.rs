use crate::config::{BackendConfig, Config};
use crate::generation::{GenerationError, ImageGenerator, TextGenerator, backoff_delay};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const RETRY_BASE: Duration = Duration::from_secs(2);

/// Azure OpenAI deployments for chat completions and image generation.
#[derive(Debug, Clone)]
pub struct AzureOpenAi {
    client: Client,
    text: BackendConfig,
    image: BackendConfig,
    image_size: String,
    max_retries: u32,
    retry_base: Duration,
}

impl AzureOpenAi {
    pub fn new(config: &Config) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            text: config.text_backend().clone(),
            image: config.image_backend().clone(),
            image_size: config.image_size().to_string(),
            max_retries: config.max_retries(),
            retry_base: RETRY_BASE,
        })
    }

    /// Override the first retry delay (tests use zero).
    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }

    fn deployment_url(backend: &BackendConfig, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            backend.endpoint.trim_end_matches('/'),
            backend.deployment,
            operation,
            backend.api_version
        )
    }

    async fn with_retries<T, F, Fut>(&self, what: &str, mut call: F) -> Result<T, GenerationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.should_retry() && attempt < self.max_retries => {
                    let delay = backoff_delay(attempt, self.retry_base);
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {}ms",
                        what,
                        attempt + 1,
                        self.max_retries + 1,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_json<Req, Resp>(
        &self,
        backend: &BackendConfig,
        url: &str,
        body: &Req,
    ) -> Result<Resp, GenerationError>
    where
        Req: Serialize + ?Sized,
        Resp: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .header("api-key", &backend.api_key) // Azure uses api-key, not Bearer
            .json(body)
            .send()
            .await
            .map_err(GenerationError::from_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(status, body));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| GenerationError::Decode(e.to_string()))
    }

    async fn chat_once(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let url = Self::deployment_url(&self.text, "chat/completions");
        let request = ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response: ChatResponse = self.post_json(&self.text, &url, &request).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(content)
    }

    /// URL of one freshly generated image.
    async fn image_once(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = Self::deployment_url(&self.image, "images/generations");
        let request = ImageRequest {
            prompt,
            size: &self.image_size,
            n: 1,
        };

        let response: ImageResponse = self.post_json(&self.image, &url, &request).await?;
        response
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or(GenerationError::EmptyResponse)
    }

    async fn download_once(&self, image_url: &str) -> Result<Bytes, GenerationError> {
        debug!("downloading generated image from {}", image_url);
        let download = self
            .client
            .get(image_url)
            .send()
            .await
            .map_err(GenerationError::from_reqwest_error)?;
        let status = download.status();
        if !status.is_success() {
            return Err(GenerationError::from_status(status, String::new()));
        }
        download
            .bytes()
            .await
            .map_err(GenerationError::from_reqwest_error)
    }
}

#[async_trait]
impl TextGenerator for AzureOpenAi {
    #[instrument(skip_all)]
    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        self.with_retries("chat completion", || self.chat_once(system, user))
            .await
    }
}

#[async_trait]
impl ImageGenerator for AzureOpenAi {
    #[instrument(skip_all)]
    async fn generate_image(&self, prompt: &str) -> Result<Bytes, GenerationError> {
        let image_url = self
            .with_retries("image generation", || self.image_once(prompt))
            .await?;
        // retry the download alone
        let bytes = self
            .with_retries("image download", || self.download_once(&image_url))
            .await
            .map_err(|e| GenerationError::Download(e.to_string()))?;
        if bytes.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(bytes)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    size: &'a str,
    n: u8,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}
