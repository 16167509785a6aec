use crate::client::Portal;
use crate::clock;
use crate::config::{Credentials, Settings};
use crate::error::{CheckinError, Result};
use crate::marker::MarkerStore;
use crate::models::{DelayConfig, SignedRecord, Status, is_already_done_text};
use crate::notify::{Notifier, messages};
use crate::parsers::user_center::parse_user_center;
use crate::snapshot::SnapshotWriter;
use std::time::Duration;
use tracing::{error, info, warn};

/// What a run ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A settling record for today already existed; nothing was written.
    SkippedToday,
    /// The run appended this record.
    Recorded(SignedRecord),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Recorded(r) if r.status == Status::Failed)
    }
}

/// Drives one check-in run for one slot.
pub struct Runner<'a> {
    slot: String,
    email: String,
    credentials: Option<Credentials>,
    attempts: u32,
    retry_delay: Duration,
    settle: DelayConfig,
    portal: &'a dyn Portal,
    store: &'a dyn MarkerStore,
    notifier: &'a dyn Notifier,
    snapshots: SnapshotWriter,
}

impl<'a> Runner<'a> {
    pub fn new(
        settings: &Settings,
        portal: &'a dyn Portal,
        store: &'a dyn MarkerStore,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            slot: settings.slot.clone(),
            email: settings.masked_email(),
            credentials: settings.credentials(),
            attempts: settings.attempts.max(1),
            retry_delay: settings.retry_delay,
            settle: settings.delay.clone(),
            portal,
            store,
            notifier,
            snapshots: SnapshotWriter::from_option(settings.snapshot_dir.as_deref()),
        }
    }

    pub fn with_snapshots(mut self, snapshots: SnapshotWriter) -> Self {
        self.snapshots = snapshots;
        self
    }

    fn record(&self, status: Status) -> SignedRecord {
        SignedRecord::new(clock::timestamp(&clock::now()), &self.slot, &self.email, status)
    }

    /// Runs the whole sequence once. Only marker-file failures are returned as errors;
    /// portal failures end up as a `FAILED` record.
    pub async fn run(&self) -> Result<Outcome> {
        info!(slot = %self.slot, account = %self.email, "starting check-in");

        let today = clock::day(&clock::now());
        if self.store.done_today(&self.slot, &today).await? {
            info!(slot = %self.slot, "already settled today, skipping");
            let summary = self.record(Status::AlreadyDone);
            self.notifier.send(&messages::already_done(&summary)).await;
            return Ok(Outcome::SkippedToday);
        }

        let Some(credentials) = self.credentials.as_ref() else {
            warn!(slot = %self.slot, "no credentials configured");
            let record = self.record(Status::CheckNoConfig);
            return self.finish(record).await;
        };

        let mut attempt = 1;
        let record = loop {
            match self.attempt(credentials).await {
                Ok(record) => break record,
                Err(e) if attempt < self.attempts => {
                    warn!(
                        attempt,
                        attempts = self.attempts,
                        error = %e,
                        "check-in attempt failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    error!(slot = %self.slot, error = %e, "check-in failed");
                    if let Some(page) = self.portal.last_page() {
                        self.snapshots.save("ERROR", &page).await;
                    }
                    break self.record(Status::Failed).with_detail(&e.to_string());
                }
            }
        };

        self.finish(record).await
    }

    async fn finish(&self, record: SignedRecord) -> Result<Outcome> {
        self.store.append(&record).await?;
        info!(slot = %self.slot, status = %record.status, "run recorded");
        self.notifier.send(&messages::for_record(&record)).await;
        Ok(Outcome::Recorded(record))
    }

    async fn attempt(&self, credentials: &Credentials) -> Result<SignedRecord> {
        self.portal.login(credentials).await?;

        let page = self.portal.user_center().await?;
        self.snapshots.save("user_center", &page).await;
        let account = parse_user_center(&page)?;

        if account.already_checked_in() {
            info!(label = %account.checkin_label, "check-in already done today");
            return Ok(self.record(Status::AlreadyDone).with_account(&account));
        }

        let reply = self.portal.check_in().await;
        if matches!(reply, Ok(_) | Err(CheckinError::CheckInRejected(_))) {
            if let Some(body) = self.portal.last_page() {
                self.snapshots
                    .save_with_extension("after_click", "json", &body)
                    .await;
            }
        }

        let status = match reply {
            Ok(message) => {
                info!(%message, "check-in accepted");
                Status::Success
            }
            Err(CheckinError::CheckInRejected(message)) if is_already_done_text(&message) => {
                info!(%message, "portal says check-in was already done");
                Status::AlreadyDone
            }
            Err(e) => return Err(e),
        };

        self.settle.pause().await;
        let page = self.portal.user_center().await?;
        self.snapshots.save("after_refresh", &page).await;
        let account = parse_user_center(&page)?;

        Ok(self.record(status).with_account(&account))
    }
}
