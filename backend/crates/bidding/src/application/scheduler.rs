//! Scheduler Sweeps
//!
//! Time-driven transitions and housekeeping. Each job reads `now` from the
//! injected clock, handles rows one at a time and writes through the same
//! status-scoped updates as the request path, so a second run is a no-op.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use platform::clock::Clock;
use serde_json::json;
use tokio::task::JoinHandle;

use crate::application::config::BiddingConfig;
use crate::application::notify::dispatch;
use crate::domain::entity::{Bidding, Notification, NotificationKind, NotificationTarget};
use crate::domain::repository::{BiddingStore, Notifier};
use crate::domain::value_object::BiddingEvent;
use crate::error::BiddingResult;

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub transitioned: usize,
    pub failed: usize,
}

pub struct Scheduler<R, N>
where
    R: BiddingStore,
    N: Notifier,
{
    repo: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    config: BiddingConfig,
}

impl<R, N> Scheduler<R, N>
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, notifier: Arc<N>, clock: Arc<dyn Clock>, config: BiddingConfig) -> Self {
        Self {
            repo,
            notifier,
            clock,
            config,
        }
    }

    /// PUBLISHED biddings whose opening date has passed → OPEN
    pub async fn sweep_open_transitions(&self) -> BiddingResult<SweepReport> {
        let now = self.clock.now();
        let due = self.repo.find_due_for_opening(now).await?;
        Ok(self.advance_all(due, BiddingEvent::Open, now).await)
    }

    /// OPEN biddings whose closing date has passed → CLOSED
    pub async fn sweep_close_transitions(&self) -> BiddingResult<SweepReport> {
        let now = self.clock.now();
        let due = self.repo.find_due_for_closing(now).await?;
        Ok(self.advance_all(due, BiddingEvent::Close, now).await)
    }

    /// Reminds participants once per bidding, within the reminder lead
    pub async fn notify_closing_soon(&self) -> BiddingResult<SweepReport> {
        let now = self.clock.now();
        let until = now + self.config.reminder_lead();
        let closing = self.repo.find_closing_soon(now, until).await?;

        let mut report = SweepReport {
            examined: closing.len(),
            ..Default::default()
        };

        for bidding in closing {
            // Stamp first: a crash afterwards loses a reminder instead of doubling it
            match self.repo.mark_reminder_sent(bidding.id, now).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::error!(error = %e, bidding_id = %bidding.id, "Closing reminder failed");
                    report.failed += 1;
                    continue;
                }
            }

            let suppliers = match self.repo.supplier_ids_for_bidding(bidding.id).await {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::error!(error = %e, bidding_id = %bidding.id, "Closing reminder failed");
                    report.failed += 1;
                    continue;
                }
            };
            for supplier_id in suppliers {
                dispatch(
                    self.notifier.as_ref(),
                    Notification::new(
                        NotificationKind::BiddingClosingSoon,
                        NotificationTarget::Supplier(supplier_id),
                        json!({
                            "biddingId": bidding.id,
                            "biddingNumber": bidding.bidding_number,
                            "closingDate": bidding.closing_date,
                        }),
                        now,
                    ),
                )
                .await;
            }
            report.transitioned += 1;
        }

        Ok(report)
    }

    /// Read notifications past the retention period
    pub async fn purge_read_notifications(&self) -> BiddingResult<u64> {
        let before = self.clock.now() - self.config.retention();
        self.notifier.purge_read(before).await
    }

    /// Every job once; failures are logged
    pub async fn run_once(&self) {
        log_sweep("open", self.sweep_open_transitions().await);
        log_sweep("close", self.sweep_close_transitions().await);
        log_sweep("closing_reminder", self.notify_closing_soon().await);

        match self.purge_read_notifications().await {
            Ok(0) => {}
            Ok(purged) => tracing::info!(purged, "Purged read notifications"),
            Err(e) => tracing::error!(error = %e, "Notification purge failed"),
        }
    }

    /// Runs [`Self::run_once`] on every tick until the task is aborted
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let period = self.config.sweep_interval.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            tracing::info!(interval_secs = period.as_secs(), "Scheduler started");

            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }

    async fn advance_all(&self, due: Vec<Bidding>, event: BiddingEvent, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport {
            examined: due.len(),
            ..Default::default()
        };

        for mut bidding in due {
            let from = match bidding.transition(event, now) {
                Ok(from) => from,
                Err(e) => {
                    tracing::warn!(error = %e, bidding_id = %bidding.id, "Sweep skipped bidding");
                    report.failed += 1;
                    continue;
                }
            };

            match self.repo.update_bidding_status(&bidding, from).await {
                Ok(true) => {
                    tracing::info!(
                        bidding_id = %bidding.id,
                        from = %from,
                        to = %bidding.status,
                        "Bidding advanced by scheduler"
                    );
                    report.transitioned += 1;
                }
                // Someone else moved it first
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(error = %e, bidding_id = %bidding.id, "Sweep update failed");
                    report.failed += 1;
                }
            }
        }

        report
    }
}

fn log_sweep(job: &'static str, result: BiddingResult<SweepReport>) {
    match result {
        Ok(report) if report.examined == 0 => {}
        Ok(report) => tracing::info!(
            job,
            examined = report.examined,
            transitioned = report.transitioned,
            failed = report.failed,
            "Sweep finished"
        ),
        Err(e) => tracing::error!(job, error = %e, "Sweep query failed"),
    }
}
