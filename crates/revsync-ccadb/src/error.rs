use reqwest::StatusCode;

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to fetch report from {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("report request to {url} returned {status}")]
    UnexpectedStatus { url: String, status: StatusCode },
    #[error("malformed report: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("CCADB record has an empty certificate field")]
    EmptyPem,
    #[error("failed to decode PEM from CCADB: '{pem_info}': {source}")]
    Pem {
        pem_info: String,
        #[source]
        source: openssl::error::ErrorStack,
    },
    #[error("failed to extract {field} from certificate: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: openssl::error::ErrorStack,
    },
    #[error(transparent)]
    Identity(#[from] revsync_identity::IdentityError),
}
