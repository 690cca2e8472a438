use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CoreResult;
use crate::fanout::FanoutEngine;
use crate::scanner::InactivityScanner;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Aggregate outcome of one inactivity sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub users: usize,
    pub contacts: usize,
    pub failed_contacts: usize,
    /// Users whose contact list could not be loaded.
    pub failed_users: usize,
}

/// Periodic inactivity sweep: scan, then notify each stale user's contacts.
pub struct Scheduler {
    scanner: InactivityScanner,
    fanout: Arc<FanoutEngine>,
    interval: Duration,
    running: AtomicBool,
}

/// Clears the running flag when a sweep ends, however it ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Scheduler {
    pub fn new(scanner: InactivityScanner, fanout: Arc<FanoutEngine>, interval: Duration) -> Self {
        Self {
            scanner,
            fanout,
            interval,
            running: AtomicBool::new(false),
        }
    }

    /// Tick on wall-clock multiples of the interval (top of the hour for the
    /// default) until `shutdown` fires.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let first = Instant::now() + until_next_boundary(Utc::now(), self.interval);
        let mut ticker = tokio::time::interval_at(first, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval = ?self.interval, "Inactivity scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.cancelled() => {
                    info!("Inactivity scheduler shutting down");
                    return;
                }
            }

            info!("Running inactivity sweep");
            match self.sweep(Utc::now()).await {
                Ok(Some(summary)) => info!(
                    users = summary.users,
                    contacts = summary.contacts,
                    failed_contacts = summary.failed_contacts,
                    failed_users = summary.failed_users,
                    "Inactivity sweep complete"
                ),
                Ok(None) => warn!("Previous inactivity sweep still running, skipping"),
                Err(e) => warn!(error = %e, "Inactivity sweep failed"),
            }
        }
    }

    /// One sweep. Returns `Ok(None)` without doing anything if another
    /// sweep is in progress.
    pub async fn sweep(&self, now: DateTime<Utc>) -> CoreResult<Option<SweepSummary>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(None);
        }
        let _guard = RunningGuard(&self.running);

        let users = self.scanner.find_inactive_users(now).await?;
        let mut summary = SweepSummary {
            users: users.len(),
            ..Default::default()
        };

        for user in users {
            info!(user_id = %user.id, "User overdue for check-in");
            match self.fanout.notify_inactive(user.id, &user.username, now).await {
                Ok(report) => {
                    summary.contacts += report.count;
                    summary.failed_contacts += report.failed;
                    if let Err(e) = self.scanner.mark_notified(user.id, now).await {
                        warn!(user_id = %user.id, error = %e, "Failed to stamp inactivity watermark");
                    }
                }
                Err(e) => {
                    warn!(user_id = %user.id, error = %e, "Failed to notify contacts of inactive user");
                    summary.failed_users += 1;
                }
            }
        }

        Ok(Some(summary))
    }
}

/// Time from `now` to the next multiple of `interval` since the Unix epoch.
fn until_next_boundary(now: DateTime<Utc>, interval: Duration) -> Duration {
    let period = interval.as_millis().max(1);
    let elapsed = now.timestamp_millis().max(0) as u128 % period;
    Duration::from_millis((period - elapsed) as u64)
}
