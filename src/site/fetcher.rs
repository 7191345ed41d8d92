use crate::site::errors::FetchError;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::{Client, ClientBuilder, StatusCode};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const USER_AGENT: &str = "BlogforgeBot/0.1";
const SNIFF_WINDOW: usize = 4096;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

/// A fetched HTML page decoded to UTF-8.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub status: StatusCode,
    pub html: String,
    pub encoding: &'static Encoding,
}

/// HTML page fetcher shared by the crawler and the text extractor.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static(
                        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                    ),
                );
                headers
            })
            .build()
            .map_err(|e| FetchError::Unknown(e.to_string()))?;
        Ok(Self { client })
    }

    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        let parsed_url = Url::parse(url)?;

        let response = self
            .client
            .get(parsed_url)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let final_url = response.url().clone();
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http { status });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?;

        // Content-Length may have been absent
        if body.len() as u64 > MAX_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(body.len() as u64));
        }

        let encoding = detect_encoding(&content_type, &body);
        let html = decode(&body, encoding)?;
        debug!(url = %final_url, bytes = body.len(), encoding = encoding.name(), "fetched page");

        Ok(Page {
            url: final_url,
            status,
            html,
            encoding,
        })
    }
}

/// Header charset, then `<meta charset>`, then `http-equiv`, then a
/// statistical guess over the first few KB.
fn detect_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    if let Some(encoding) = label_from(&CHARSET_REGEX, content_type) {
        return encoding;
    }

    let window = &body[..body.len().min(SNIFF_WINDOW)];
    let head = String::from_utf8_lossy(window);
    for regex in [&*META_CHARSET_REGEX, &*META_HTTP_EQUIV_REGEX] {
        if let Some(encoding) = label_from(regex, &head) {
            return encoding;
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(window, false);
    detector.guess(None, true)
}

fn label_from(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

fn decode(body: &[u8], encoding: &'static Encoding) -> Result<String, FetchError> {
    let (decoded, _, had_errors) = encoding.decode(body);
    if had_errors {
        return Err(FetchError::Charset(format!(
            "failed to decode content as {}",
            encoding.name()
        )));
    }
    Ok(decoded.into_owned())
}
