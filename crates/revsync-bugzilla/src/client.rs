use std::sync::LazyLock;

use regex::Regex;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Authenticator;
use crate::error::{BugzillaError, BugzillaResult};
use crate::model::{
    AttachmentCreate, AttachmentCreated, Bug, BugCreate, BugCreated, BugList, BugUpdate,
    BugUpdated, UpdateResponse, VersionResponse,
};

const DEFAULT_TOOL: &str = concat!("revsync/", env!("CARGO_PKG_VERSION"));

static SHOW_BUG_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"id=(\d+)").expect("valid show_bug regex"));

#[derive(Debug, Clone)]
pub struct BugzillaClient {
    http: reqwest::Client,
    host: String,
    base: String,
    tool: String,
    authenticator: Authenticator,
}

impl BugzillaClient {
    /// `host` is `<scheme>://<host>[:<port>]` without a path; the REST root
    /// is derived from it.
    pub fn new(host: &str) -> BugzillaResult<Self> {
        Url::parse(host).map_err(|source| BugzillaError::InvalidUrl {
            url: host.to_string(),
            source,
        })?;
        let host = host.trim_end_matches('/').to_string();
        Ok(Self {
            http: reqwest::Client::new(),
            base: format!("{host}/rest"),
            host,
            tool: DEFAULT_TOOL.to_string(),
            authenticator: Authenticator::Unauthenticated,
        })
    }

    pub fn with_authenticator(mut self, authenticator: Authenticator) -> Self {
        self.authenticator = authenticator;
        self
    }

    pub fn with_tool_header(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub async fn version(&self) -> BugzillaResult<String> {
        let response: VersionResponse = self
            .request(Method::GET, "/version", None::<&()>, StatusCode::OK)
            .await?;
        Ok(response.version)
    }

    /// File a new bug and return its id.
    pub async fn create_bug(&self, bug: &BugCreate) -> BugzillaResult<u64> {
        let created: BugCreated = self
            .request(Method::POST, "/bug", Some(bug), StatusCode::OK)
            .await?;
        Ok(created.id)
    }

    pub async fn get_bug(&self, id: u64) -> BugzillaResult<Option<Bug>> {
        let list: BugList = self
            .request(Method::GET, &format!("/bug/{id}"), None::<&()>, StatusCode::OK)
            .await?;
        Ok(list.bugs.into_iter().next())
    }

    /// Attach a file to the first bug in `attachment.ids`; returns the new
    /// attachment ids.
    pub async fn create_attachment(&self, attachment: &AttachmentCreate) -> BugzillaResult<Vec<u64>> {
        let bug = attachment.ids.first().copied().unwrap_or_default();
        let created: AttachmentCreated = self
            .request(
                Method::POST,
                &format!("/bug/{bug}/attachment"),
                Some(attachment),
                StatusCode::CREATED,
            )
            .await?;
        Ok(created.ids)
    }

    pub async fn update_bug(&self, update: &BugUpdate) -> BugzillaResult<Vec<BugUpdated>> {
        let response: UpdateResponse = self
            .request(
                Method::PUT,
                &format!("/bug/{}", update.id),
                Some(update),
                StatusCode::OK,
            )
            .await?;
        Ok(response.bugs)
    }

    pub async fn add_comment(&self, id: u64, body: &str) -> BugzillaResult<()> {
        self.update_bug(&BugUpdate::comment(id, body)).await?;
        Ok(())
    }

    /// Resolve the bug as `INVALID` with `reason` as the closing comment.
    pub async fn invalidate(&self, id: u64, reason: &str) -> BugzillaResult<()> {
        self.update_bug(&BugUpdate::invalidate(id, reason)).await?;
        Ok(())
    }

    /// Web view of a bug: `<host>/show_bug.cgi?id=<id>`.
    pub fn show_bug(&self, id: u64) -> String {
        format!("{}/show_bug.cgi?id={id}", self.host)
    }

    /// Recover the bug id from a [`BugzillaClient::show_bug`] URL.
    pub fn id_from_show_bug(&self, url: &str) -> BugzillaResult<u64> {
        SHOW_BUG_ID
            .captures(url)
            .and_then(|captures| captures.get(1))
            .and_then(|id| id.as_str().parse().ok())
            .ok_or_else(|| BugzillaError::NoBugId(url.to_string()))
    }

    async fn request<B, T>(
        &self,
        method: Method,
        resource: &str,
        body: Option<&B>,
        expected: StatusCode,
    ) -> BugzillaResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base, resource);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header("X-AUTOMATED-TOOL", &self.tool)
            .header(reqwest::header::ACCEPT, "application/json");
        request = self.authenticator.apply(request);
        if let Some(body) = body {
            let body = serde_json::to_vec(body).map_err(BugzillaError::Encode)?;
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }
        debug!(%method, %url, "bugzilla request");

        let response = request.send().await.map_err(|source| BugzillaError::Http {
            url: url.clone(),
            source,
        })?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|source| BugzillaError::Http {
            url: url.clone(),
            source,
        })?;
        if status != expected {
            return Err(BugzillaError::UnexpectedStatus {
                url,
                status,
                expected,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        serde_json::from_slice(&bytes).map_err(|source| BugzillaError::Decode { url, source })
    }
}
