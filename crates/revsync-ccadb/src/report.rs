use std::io::Read;
use std::sync::Arc;

use revsync_identity::IdentitySet;
use tracing::{debug, info};

use crate::certificate::Certificate;
use crate::error::{ReportError, ReportResult};

pub const DEFAULT_REPORT_URL: &str =
    "https://ccadb-public.secure.force.com/mozilla/PublicInterCertsReadyToAddToOneCRLPEMCSV";

/// Parse a CSV report. Columns are matched by header name; a missing column
/// or a short row fails the whole report.
pub fn from_reader<R: Read>(reader: R) -> ReportResult<Vec<Certificate>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    debug!(rows = rows.len(), "parsed CCADB report");
    Ok(rows)
}

pub async fn fetch_report(url: &str) -> ReportResult<Vec<Certificate>> {
    info!(%url, "fetching CCADB report");
    let response = reqwest::get(url).await.map_err(|source| ReportError::Http {
        url: url.to_string(),
        source,
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(ReportError::UnexpectedStatus {
            url: url.to_string(),
            status,
        });
    }
    let body = response.bytes().await.map_err(|source| ReportError::Http {
        url: url.to_string(),
        source,
    })?;
    from_reader(body.as_ref())
}

/// The reconciliation set of the rows still waiting to be added.
pub fn ready_to_add(report: impl IntoIterator<Item = Certificate>) -> IdentitySet<Certificate> {
    report
        .into_iter()
        .filter(Certificate::is_ready_to_add)
        .map(Arc::new)
        .collect()
}
