use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use revsync_kinto::{Collection, KintoClient, SignerStatus};
use tracing::debug;

use super::traits::RevocationStore;
use crate::record::OneCrlRecord;

/// A OneCRL collection served by Kinto.
#[derive(Debug, Clone)]
pub struct KintoStore {
    environment: String,
    client: Arc<KintoClient>,
    collection: Collection,
}

impl KintoStore {
    pub fn new(environment: impl Into<String>, client: Arc<KintoClient>, collection: Collection) -> Self {
        Self {
            environment: environment.into(),
            client,
            collection,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    fn id<'a>(&self, record: &'a OneCrlRecord) -> anyhow::Result<&'a str> {
        record
            .id
            .as_deref()
            .with_context(|| format!("{} record has no id", self.environment))
    }
}

#[async_trait]
impl RevocationStore for KintoStore {
    fn environment(&self) -> &str {
        &self.environment
    }

    async fn try_auth(&self) -> anyhow::Result<bool> {
        Ok(self.client.try_auth().await?)
    }

    async fn fetch_all(&self) -> anyhow::Result<Vec<OneCrlRecord>> {
        let records: Vec<OneCrlRecord> = self
            .client
            .all_records(&self.collection)
            .await
            .with_context(|| format!("failed to fetch {} records", self.environment))?;
        debug!(environment = %self.environment, records = records.len(), "fetched OneCRL");
        Ok(records)
    }

    async fn insert(&self, record: &OneCrlRecord) -> anyhow::Result<OneCrlRecord> {
        Ok(self.client.new_record(&self.collection, record).await?)
    }

    async fn delete(&self, record: &OneCrlRecord) -> anyhow::Result<()> {
        self.client
            .delete_record(&self.collection, self.id(record)?)
            .await?;
        Ok(())
    }

    async fn patch(&self, record: &OneCrlRecord) -> anyhow::Result<OneCrlRecord> {
        Ok(self
            .client
            .update_record(&self.collection, self.id(record)?, record)
            .await?)
    }

    async fn review_state(&self) -> anyhow::Result<Option<SignerStatus>> {
        Ok(self.client.collection_status(&self.collection).await?)
    }

    async fn transition(&self, target: SignerStatus) -> anyhow::Result<()> {
        self.client
            .set_status(&self.collection, target)
            .await
            .with_context(|| format!("failed to move {} into {target}", self.environment))
    }
}
