use std::sync::Mutex;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::auth::Authenticator;
use crate::collection::{Collection, CollectionMetadata, Deleted, Envelope, StatusPatch};
use crate::error::{KintoError, KintoResult};
use crate::signer::SignerStatus;

const OK: &[StatusCode] = &[StatusCode::OK];
const OK_OR_CREATED: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED];

const DEFAULT_TOOL: &str = concat!("revsync/", env!("CARGO_PKG_VERSION"));

/// State shared by every request: the server-requested backoff and the
/// credentials. Guarded together so swapping credentials never races a
/// request in flight.
#[derive(Debug, Default)]
struct Shared {
    backoff: Duration,
    authenticator: Authenticator,
}

/// Kinto REST client. Safe to share across tasks.
#[derive(Debug)]
pub struct KintoClient {
    http: reqwest::Client,
    base: String,
    tool: String,
    shared: Mutex<Shared>,
}

impl KintoClient {
    /// `base` is the API root including its version prefix, e.g.
    /// `https://settings.prod.mozaws.net/v1`.
    pub fn new(base: &str) -> KintoResult<Self> {
        Url::parse(base).map_err(|source| KintoError::InvalidUrl {
            url: base.to_string(),
            source,
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
            tool: DEFAULT_TOOL.to_string(),
            shared: Mutex::new(Shared::default()),
        })
    }

    pub fn with_authenticator(self, authenticator: Authenticator) -> Self {
        self.set_authenticator(authenticator);
        self
    }

    /// Value for the `X-AUTOMATED-TOOL` header sent with every request.
    pub fn with_tool_header(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    pub fn set_authenticator(&self, authenticator: Authenticator) {
        self.shared.lock().expect("kinto client state poisoned").authenticator = authenticator;
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Delay the server most recently asked for before the next request.
    pub fn backoff(&self) -> Duration {
        self.shared.lock().expect("kinto client state poisoned").backoff
    }

    /// Whether the configured credentials are accepted: the root resource
    /// only reports a `user` object for authenticated callers.
    pub async fn try_auth(&self) -> KintoResult<bool> {
        let root: Value = self.request(Method::GET, "/", None::<&()>, OK).await?;
        Ok(root.get("user").is_some())
    }

    /// The server's `settings.batch_max_requests`.
    pub async fn batch_max_requests(&self) -> KintoResult<u64> {
        let root: Value = self.request(Method::GET, "/", None::<&()>, OK).await?;
        Ok(root
            .pointer("/settings/batch_max_requests")
            .and_then(Value::as_u64)
            .unwrap_or_default())
    }

    pub async fn all_records<T: DeserializeOwned>(&self, collection: &Collection) -> KintoResult<Vec<T>> {
        let envelope: Envelope<Vec<T>> = self
            .request(Method::GET, &collection.records_path(), None::<&()>, OK)
            .await?;
        Ok(envelope.data)
    }

    /// Create a record and return it as stored, with its assigned id.
    pub async fn new_record<T>(&self, collection: &Collection, record: &T) -> KintoResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let envelope: Envelope<T> = self
            .request(
                Method::POST,
                &collection.records_path(),
                Some(&Envelope::new(record)),
                OK_OR_CREATED,
            )
            .await?;
        Ok(envelope.data)
    }

    /// PATCH the record with the given id.
    pub async fn update_record<T>(&self, collection: &Collection, id: &str, record: &T) -> KintoResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let envelope: Envelope<T> = self
            .request(
                Method::PATCH,
                &collection.record_path(id),
                Some(&Envelope::new(record)),
                OK_OR_CREATED,
            )
            .await?;
        Ok(envelope.data)
    }

    pub async fn delete_record(&self, collection: &Collection, id: &str) -> KintoResult<Deleted> {
        let envelope: Envelope<Deleted> = self
            .request(Method::DELETE, &collection.record_path(id), None::<&()>, OK)
            .await?;
        Ok(envelope.data)
    }

    /// Current signer state of the collection, if the signer manages it.
    pub async fn collection_status(&self, collection: &Collection) -> KintoResult<Option<SignerStatus>> {
        let envelope: Envelope<CollectionMetadata> = self
            .request(Method::GET, &collection.path(), None::<&()>, OK)
            .await?;
        Ok(envelope.data.status)
    }

    pub async fn set_status(&self, collection: &Collection, status: SignerStatus) -> KintoResult<()> {
        info!(collection = %collection.path(), %status, "requesting signer transition");
        let _: Value = self
            .request(
                Method::PATCH,
                &collection.path(),
                Some(&Envelope::new(StatusPatch { status })),
                OK_OR_CREATED,
            )
            .await?;
        Ok(())
    }

    pub async fn to_wip(&self, collection: &Collection) -> KintoResult<()> {
        self.set_status(collection, SignerStatus::WorkInProgress).await
    }

    pub async fn to_review(&self, collection: &Collection) -> KintoResult<()> {
        self.set_status(collection, SignerStatus::ToReview).await
    }

    pub async fn to_sign(&self, collection: &Collection) -> KintoResult<()> {
        self.set_status(collection, SignerStatus::ToSign).await
    }

    pub async fn to_signed(&self, collection: &Collection) -> KintoResult<()> {
        self.set_status(collection, SignerStatus::Signed).await
    }

    pub async fn to_rollback(&self, collection: &Collection) -> KintoResult<()> {
        self.set_status(collection, SignerStatus::ToRollback).await
    }

    pub async fn to_resign(&self, collection: &Collection) -> KintoResult<()> {
        self.set_status(collection, SignerStatus::ToResign).await
    }

    async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        expected: &[StatusCode],
    ) -> KintoResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base, path);
        let (backoff, authenticator) = {
            let shared = self.shared.lock().expect("kinto client state poisoned");
            (shared.backoff, shared.authenticator.clone())
        };
        if !backoff.is_zero() {
            info!(seconds = backoff.as_secs(), "Kinto asked us to back off");
            tokio::time::sleep(backoff).await;
        }

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header("X-AUTOMATED-TOOL", &self.tool);
        request = authenticator.apply(request);
        if let Some(body) = body {
            let body = serde_json::to_vec(body).map_err(KintoError::Encode)?;
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }
        debug!(%method, %url, "kinto request");

        let response = request.send().await.map_err(|source| KintoError::Http {
            url: url.clone(),
            source,
        })?;
        self.record_backoff(response.headers())?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|source| KintoError::Http {
            url: url.clone(),
            source,
        })?;
        if !expected.contains(&status) {
            return Err(KintoError::UnexpectedStatus {
                url,
                status,
                expected: expected.iter().map(StatusCode::as_u16).collect(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        serde_json::from_slice(&bytes).map_err(|source| KintoError::Decode { url, source })
    }

    fn record_backoff(&self, headers: &reqwest::header::HeaderMap) -> KintoResult<()> {
        let backoff = match headers.get("Backoff") {
            None => Duration::ZERO,
            Some(value) => {
                let raw = String::from_utf8_lossy(value.as_bytes()).into_owned();
                let seconds: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| KintoError::InvalidBackoff(raw.clone()))?;
                Duration::from_secs(seconds)
            }
        };
        self.shared.lock().expect("kinto client state poisoned").backoff = backoff;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_base_url() {
        assert!(matches!(
            KintoClient::new("not a url"),
            Err(KintoError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = KintoClient::new("http://localhost:8888/v1/").unwrap();
        assert_eq!(client.base(), "http://localhost:8888/v1");
        assert_eq!(client.backoff(), Duration::ZERO);
    }
}
