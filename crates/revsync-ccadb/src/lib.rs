//! The CCADB "ready to add to OneCRL" intermediate report.
//!
//! Each row carries the revoked certificate itself, so a row can be
//! reconciled by either identity.

mod certificate;
mod error;
mod report;

pub use certificate::{Certificate, READY_TO_ADD};
pub use error::{CertificateError, ReportError, ReportResult};
pub use report::{DEFAULT_REPORT_URL, fetch_report, from_reader, ready_to_add};
