use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("listing #{index} on {page} has no `{field}` field")]
    MalformedListing {
        page: String,
        index: usize,
        field: &'static str,
    },

    #[error("cannot resolve next page link `{href}` against {base}")]
    InvalidUrl { base: String, href: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("api error: {0}")]
    Api(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnrichmentError {
    #[error("gave up after {attempts} attempts, last error: {last_error}")]
    Timeout {
        attempts: u32,
        last_error: ServiceError,
    },

    #[error("enrichment cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ServiceError::MalformedResponse(e.to_string())
        } else if e.status().map(|s| s.as_u16()) == Some(429) {
            ServiceError::RateLimited(e.to_string())
        } else {
            ServiceError::Transport(e.to_string())
        }
    }
}
