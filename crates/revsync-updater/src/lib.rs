//! Reconcile OneCRL against the CCADB and file the additions.
//!
//! [`Updater::run`] compares the report with the union of the staging and
//! production collections. Missing entries are pushed through a [`Saga`]:
//! stage, file a ticket, stamp the ticket on the records, request review,
//! then promote to production. While staging is already in review, nothing
//! is written; the tickets of the pending entries are pinged instead.
//!
//! [`Saga`]: revsync_saga::Saga

mod adapters;
mod config;
mod record;
mod workflow;

pub use adapters::{CcadbReport, KintoStore, ReportSource, RevocationStore, TicketTracker};
pub use config::{
    BugzillaConfig, ConfigError, DEFAULT_BUCKET, DEFAULT_BUGZILLA_URL, DEFAULT_COLLECTION,
    DEFAULT_PRODUCTION_URL, DEFAULT_STAGING_URL, StoreConfig, UpdaterConfig, parse_cc_accounts,
    resolve_principal,
};
pub use record::{Comparison, Details, OneCrlRecord, Side};
pub use workflow::{UpdateOutcome, Updater};
