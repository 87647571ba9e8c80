use async_trait::async_trait;
use revsync_bugzilla::{AttachmentCreate, BugCreate};
use revsync_ccadb::Certificate;
use revsync_kinto::SignerStatus;

use crate::record::OneCrlRecord;

/// One OneCRL collection in one environment.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// `staging` or `production`; used in logs and errors.
    fn environment(&self) -> &str;
    async fn try_auth(&self) -> anyhow::Result<bool>;
    async fn fetch_all(&self) -> anyhow::Result<Vec<OneCrlRecord>>;
    /// Returns the stored record, carrying the id the store assigned.
    async fn insert(&self, record: &OneCrlRecord) -> anyhow::Result<OneCrlRecord>;
    async fn delete(&self, record: &OneCrlRecord) -> anyhow::Result<()>;
    async fn patch(&self, record: &OneCrlRecord) -> anyhow::Result<OneCrlRecord>;
    async fn review_state(&self) -> anyhow::Result<Option<SignerStatus>>;
    async fn transition(&self, target: SignerStatus) -> anyhow::Result<()>;
}

#[async_trait]
pub trait TicketTracker: Send + Sync {
    async fn create_ticket(&self, ticket: &BugCreate) -> anyhow::Result<u64>;
    async fn attach_file(&self, attachment: &AttachmentCreate) -> anyhow::Result<()>;
    async fn add_comment(&self, id: u64, body: &str) -> anyhow::Result<()>;
    async fn set_status(
        &self,
        id: u64,
        status: &str,
        resolution: &str,
        comment: &str,
    ) -> anyhow::Result<()>;
    fn show_url(&self, id: u64) -> String;
    fn id_from_url(&self, url: &str) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<Vec<Certificate>>;
}
