use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("backend returned {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("rate limited by backend")]
    RateLimited,

    #[error("request timeout")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed backend response: {0}")]
    Decode(String),

    #[error("backend returned no content")]
    EmptyResponse,

    #[error("image download failed: {0}")]
    Download(String),
}

impl GenerationError {
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Http { status, .. } => status.is_server_error(),
            Self::RateLimited => true,
            Self::Timeout => true,
            Self::Transport(_) => true,

            Self::Decode(_) => false,
            Self::Download(_) => false,
            Self::EmptyResponse => false,
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status, String::new())
        } else {
            Self::Transport(err.to_string())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited
        } else {
            Self::Http { status, body }
        }
    }
}
