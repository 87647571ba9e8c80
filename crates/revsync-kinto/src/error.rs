use reqwest::StatusCode;

pub type KintoResult<T> = Result<T, KintoError>;

#[derive(Debug, thiserror::Error)]
pub enum KintoError {
    #[error("invalid Kinto base URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("expected status {expected:?} from {url}, got {status}: {body}")]
    UnexpectedStatus {
        url: String,
        status: StatusCode,
        expected: Vec<u16>,
        body: String,
    },
    #[error("Kinto sent a Backoff header that is not an integer: '{0}'")]
    InvalidBackoff(String),
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}
