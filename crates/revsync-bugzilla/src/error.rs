use reqwest::StatusCode;

pub type BugzillaResult<T> = Result<T, BugzillaError>;

#[derive(Debug, thiserror::Error)]
pub enum BugzillaError {
    #[error("invalid Bugzilla host '{url}': {source}")]
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
    #[error("expected status {expected} from {url}, got {status}: {body}")]
    UnexpectedStatus {
        url: String,
        status: StatusCode,
        expected: StatusCode,
        body: String,
    },
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("no bug id found in '{0}'")]
    NoBugId(String),
}
