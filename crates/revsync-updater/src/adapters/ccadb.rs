use async_trait::async_trait;
use revsync_ccadb::{Certificate, DEFAULT_REPORT_URL, fetch_report};

use super::traits::ReportSource;

/// The CCADB report fetched over HTTP on every run.
#[derive(Debug, Clone)]
pub struct CcadbReport {
    url: String,
}

impl CcadbReport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for CcadbReport {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_URL)
    }
}

#[async_trait]
impl ReportSource for CcadbReport {
    async fn fetch(&self) -> anyhow::Result<Vec<Certificate>> {
        Ok(fetch_report(&self.url).await?)
    }
}
