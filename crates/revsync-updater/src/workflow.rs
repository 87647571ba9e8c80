use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::{SecondsFormat, Utc};
use revsync_bugzilla::{AttachmentCreate, Authenticator as BugzillaAuthenticator, BugCreate, BugzillaClient};
use revsync_ccadb::{Certificate, ready_to_add};
use revsync_identity::IdentitySet;
use revsync_kinto::{KintoClient, SignerStatus};
use revsync_saga::{ErrorChain, Saga, Transaction, Transactor};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::adapters::{CcadbReport, KintoStore, ReportSource, RevocationStore, TicketTracker};
use crate::config::{ConfigError, StoreConfig, UpdaterConfig};
use crate::record::OneCrlRecord;

const TICKET_DESCRIPTION: &str =
    "Adding entries to OneCRL based on revoked intermediate certificates reported in the CCADB.";

const REVIEW_REMINDER: &str =
    "Staging is in review. The following bugs appear to require resolution.\n";

/// Bugzilla answers attachment uploads with a spurious S3 error even when
/// the upload worked.
const ATTACHMENT_WARNING: &str = "attachment upload reported an error; Bugzilla often reports a \
     'Failed to fetch attachment ID <ID> from S3' error for uploads that did succeed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The report holds nothing OneCRL lacks.
    NoChanges,
    /// Staging was already in review; these tickets were reminded.
    InReview { notified: Vec<u64> },
    Updated { ticket_url: String },
}

/// State handed from one saga step to the next.
#[derive(Debug, Default)]
struct Run {
    changes: Vec<OneCrlRecord>,
    /// How many of `changes` made it into staging.
    staged: usize,
    ticket: Option<u64>,
}

type SharedRun = Arc<Mutex<Run>>;

pub struct Updater {
    staging: Arc<dyn RevocationStore>,
    production: Arc<dyn RevocationStore>,
    tickets: Arc<dyn TicketTracker>,
    report: Arc<dyn ReportSource>,
    cc: Vec<String>,
}

impl Updater {
    pub fn new(
        staging: Arc<dyn RevocationStore>,
        production: Arc<dyn RevocationStore>,
        tickets: Arc<dyn TicketTracker>,
        report: Arc<dyn ReportSource>,
    ) -> Self {
        Self {
            staging,
            production,
            tickets,
            report,
            cc: Vec::new(),
        }
    }

    /// Accounts added to the CC list of filed tickets.
    pub fn with_cc(mut self, cc: Vec<String>) -> Self {
        self.cc = cc;
        self
    }

    pub fn from_config(config: &UpdaterConfig) -> Result<Self, ConfigError> {
        let staging = kinto_store("staging", &config.staging)?;
        let production = kinto_store("production", &config.production)?;

        let mut bugzilla = BugzillaClient::new(&config.bugzilla.url)?;
        if let Some(key) = config.bugzilla.api_key.as_deref().filter(|key| !key.is_empty()) {
            bugzilla = bugzilla.with_authenticator(BugzillaAuthenticator::ApiKey(key.to_string()));
        }

        Ok(Self::new(
            staging,
            production,
            Arc::new(bugzilla),
            Arc::new(CcadbReport::new(&config.report_url)),
        )
        .with_cc(config.bugzilla.cc.clone()))
    }

    /// Reconcile once. Nothing is written unless the report holds entries
    /// OneCRL lacks and staging is not already in review.
    pub async fn run(&self) -> anyhow::Result<UpdateOutcome> {
        self.try_auth().await?;

        if self.staging_in_review().await? {
            info!("staging is in review");
            let intersection = self.find_intersection().await?;
            let notified = self.notify_blocking_tickets(&intersection).await;
            return Ok(UpdateOutcome::InReview { notified });
        }

        let changes = self.find_diffs().await?;
        if changes.is_empty() {
            info!("no differences found between the CCADB and OneCRL staging/production");
            return Ok(UpdateOutcome::NoChanges);
        }
        info!(records = changes.len(), "found entries missing from OneCRL");

        let run: SharedRun = Arc::new(Mutex::new(Run {
            changes,
            ..Run::default()
        }));
        let mut saga = Saga::start()
            .then(self.push_to_staging(&run))
            .then(self.open_ticket(&run))
            .then(self.stamp_ticket(&run))
            .then(self.request_review())
            .then(self.push_to_production(&run))
            .auto_rollback_on_error(true)
            .auto_close(true);
        saga.commit().await?;

        let ticket = run
            .lock()
            .await
            .ticket
            .ok_or_else(|| anyhow!("update finished without a ticket"))?;
        let ticket_url = self.tickets.show_url(ticket);
        info!(ticket = %ticket_url, "successfully completed update");
        Ok(UpdateOutcome::Updated { ticket_url })
    }

    /// Check the credentials against both environments. Every failure is
    /// reported, not just the first.
    pub async fn try_auth(&self) -> anyhow::Result<()> {
        let mut errors = ErrorChain::new();
        for store in [&self.staging, &self.production] {
            match store.try_auth().await {
                Ok(true) => debug!(environment = store.environment(), "authenticated"),
                Ok(false) => errors.push(anyhow!(
                    "authentication for {} Kinto failed",
                    store.environment()
                )),
                Err(err) => errors.push(err),
            }
        }
        errors.into_result()
    }

    pub async fn staging_in_review(&self) -> anyhow::Result<bool> {
        let status = self.staging.review_state().await?;
        debug!(status = ?status, "staging review state");
        Ok(status.is_some_and(|status| status.in_review()))
    }

    /// Report rows missing from both staging and production, as proposed
    /// OneCRL entries.
    pub async fn find_diffs(&self) -> anyhow::Result<Vec<OneCrlRecord>> {
        let (onecrl, report) = self.data_sets().await?;
        report
            .difference(&onecrl)
            .iter()
            .map(|certificate| {
                OneCrlRecord::from_ccadb(Arc::clone(certificate)).with_context(|| {
                    format!(
                        "failed to build a OneCRL entry for '{}'",
                        certificate.certificate_name
                    )
                })
            })
            .collect()
    }

    /// OneCRL entries (staging or production) the report still lists as
    /// waiting to be added.
    pub async fn find_intersection(&self) -> anyhow::Result<IdentitySet<OneCrlRecord>> {
        let (onecrl, report) = self.data_sets().await?;
        Ok(onecrl.intersection(&report))
    }

    async fn data_sets(
        &self,
    ) -> anyhow::Result<(IdentitySet<OneCrlRecord>, IdentitySet<Certificate>)> {
        let production: IdentitySet<OneCrlRecord> =
            self.production.fetch_all().await?.into_iter().map(Arc::new).collect();
        let staging: IdentitySet<OneCrlRecord> =
            self.staging.fetch_all().await?.into_iter().map(Arc::new).collect();
        let onecrl = production.union(&staging);
        let report = ready_to_add(self.report.fetch().await.context("failed to fetch the CCADB report")?);
        debug!(onecrl = onecrl.len(), report = report.len(), "loaded data sets");
        Ok((onecrl, report))
    }

    /// Comment once on every ticket referenced by `pending`, listing all of
    /// them. Returns the tickets that were reached.
    pub async fn notify_blocking_tickets(&self, pending: &IdentitySet<OneCrlRecord>) -> Vec<u64> {
        let mut ids = Vec::new();
        let mut message = String::from(REVIEW_REMINDER);
        for entry in pending.iter() {
            let url = &entry.details.bug;
            let id = match self.tickets.id_from_url(url) {
                Ok(id) => id,
                Err(err) => {
                    error!(%url, "failed to retrieve ticket id from URL: {err:#}");
                    continue;
                }
            };
            if ids.contains(&id) {
                continue;
            }
            message.push('\t');
            message.push_str(url);
            message.push('\n');
            ids.push(id);
        }

        let mut notified = Vec::with_capacity(ids.len());
        for id in ids {
            match self.tickets.add_comment(id, &message).await {
                Ok(()) => notified.push(id),
                Err(err) => warn!(ticket = id, "failed to ping blocking bug: {err:#}"),
            }
        }
        notified
    }

    /// Insert every change into staging. Rollback deletes exactly those that
    /// were inserted.
    fn push_to_staging(&self, run: &SharedRun) -> impl Transactor + 'static {
        let (store, commit_run) = (Arc::clone(&self.staging), Arc::clone(run));
        let (undo_store, undo_run) = (Arc::clone(&self.staging), Arc::clone(run));
        Transaction::new()
            .with_commit(move || async move {
                let mut run = commit_run.lock().await;
                for index in 0..run.changes.len() {
                    let stored = store.insert(&run.changes[index]).await?;
                    let record = &mut run.changes[index];
                    record.id = stored.id;
                    record.last_modified = stored.last_modified;
                    run.staged += 1;
                }
                info!(records = run.staged, "pushed additions to staging");
                Ok(())
            })
            .with_rollback(move |_| async move {
                let run = undo_run.lock().await;
                let mut errors = ErrorChain::new();
                for record in &run.changes[..run.staged] {
                    errors.push_result(undo_store.delete(record).await);
                }
                info!(records = run.staged, "removed additions from staging");
                errors.into_result()
            })
    }

    /// File the ticket and attach the proposed entries. Rollback closes the
    /// ticket as invalid, quoting the failure.
    fn open_ticket(&self, run: &SharedRun) -> impl Transactor + 'static {
        let (tickets, commit_run) = (Arc::clone(&self.tickets), Arc::clone(run));
        let (undo_tickets, undo_run) = (Arc::clone(&self.tickets), Arc::clone(run));
        let cc = self.cc.clone();
        Transaction::new()
            .with_commit(move || async move {
                let mut run = commit_run.lock().await;
                let ticket = BugCreate {
                    product: "Toolkit".to_string(),
                    component: "Blocklist Policy Requests".to_string(),
                    summary: format!(
                        "CCADB entries generated {}",
                        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
                    ),
                    version: "unspecified".to_string(),
                    severity: "normal".to_string(),
                    kind: "enhancement".to_string(),
                    description: TICKET_DESCRIPTION.to_string(),
                    cc,
                    ..BugCreate::default()
                };
                debug!(?ticket, "filing ticket");
                let id = tickets.create_ticket(&ticket).await?;
                let url = tickets.show_url(id);
                info!(ticket = %url, "filed ticket");
                run.ticket = Some(id);
                for record in &mut run.changes {
                    record.details.bug = url.clone();
                }

                let pairs: String = run
                    .changes
                    .iter()
                    .map(|r| format!("issuer: {} serial: {}\n", r.issuer_name, r.serial_number))
                    .collect();
                attach(
                    &*tickets,
                    AttachmentCreate::text(id, "BugData.txt", "Line delimited issuer/serial pairs", pairs),
                )
                .await;

                let additions = serde_json::to_vec_pretty(&run.changes)?;
                attach(
                    &*tickets,
                    AttachmentCreate::text(
                        id,
                        "OneCRLAdditions.txt",
                        "The additions to OneCRL proposed by this bug.",
                        additions,
                    ),
                )
                .await;

                let comparisons = run
                    .changes
                    .iter()
                    .map(OneCrlRecord::to_comparison)
                    .collect::<Result<Vec<_>, _>>()
                    .context("failed to generate a OneCRL/CCADB comparison")?;
                attach(
                    &*tickets,
                    AttachmentCreate::text(
                        id,
                        "DecodedEntries.txt",
                        "Entries with their names decoded to plain text and hexadecimal serials/hashes.",
                        serde_json::to_vec_pretty(&comparisons)?,
                    ),
                )
                .await;
                Ok(())
            })
            .with_rollback(move |cause| {
                let report = format!(
                    "This tool experienced a fatal error downstream of posting this bug. \
                     This bug will be closed. Please review the cause below.\n\n{cause:#}"
                );
                async move {
                    let Some(id) = undo_run.lock().await.ticket else {
                        return Ok(());
                    };
                    error!(ticket = %undo_tickets.show_url(id), "closing ticket after a critical failure");
                    undo_tickets
                        .set_status(id, "RESOLVED", "INVALID", &report)
                        .await
                }
            })
    }

    /// Record the ticket on every staged entry and ask for a signature.
    /// Earlier steps' rollbacks remove the entries, so there is nothing to
    /// undo here.
    fn stamp_ticket(&self, run: &SharedRun) -> impl Transactor + 'static {
        let (store, run) = (Arc::clone(&self.staging), Arc::clone(run));
        Transaction::new().with_commit(move || async move {
            let run = run.lock().await;
            for record in &run.changes {
                store.patch(record).await?;
            }
            store.transition(SignerStatus::ToSign).await
        })
    }

    fn request_review(&self) -> impl Transactor + 'static {
        let store = Arc::clone(&self.staging);
        let undo_store = Arc::clone(&self.staging);
        Transaction::new()
            .with_commit(move || async move { store.transition(SignerStatus::ToReview).await })
            .with_rollback(move |_| async move { undo_store.transition(SignerStatus::ToRollback).await })
    }

    /// Insert the changes into production under ids production assigns.
    fn push_to_production(&self, run: &SharedRun) -> impl Transactor + 'static {
        let (store, run) = (Arc::clone(&self.production), Arc::clone(run));
        Transaction::new().with_commit(move || async move {
            let run = run.lock().await;
            for record in &run.changes {
                let record = OneCrlRecord {
                    id: None,
                    last_modified: None,
                    ..record.clone()
                };
                store.insert(&record).await?;
            }
            info!(records = run.changes.len(), "pushed additions to production");
            Ok(())
        })
    }
}

async fn attach(tickets: &dyn TicketTracker, attachment: AttachmentCreate) {
    if let Err(err) = tickets.attach_file(&attachment).await {
        warn!(attachment = %attachment.file_name, "{ATTACHMENT_WARNING}: {err:#}");
    }
}

fn kinto_store(environment: &str, config: &StoreConfig) -> Result<Arc<dyn RevocationStore>, ConfigError> {
    let client = KintoClient::new(&config.url)?.with_authenticator(config.authenticator(environment)?);
    Ok(Arc::new(KintoStore::new(environment, Arc::new(client), config.collection())))
}
