//! Background follow-up runs.
//!
//! Every tick first creates trackings for newly eligible delivered shipments,
//! then runs the dunning cycle so fresh trackings are evaluated in the same pass.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use freightbook_core::tracking::BulkPolicy;
use freightbook_db::{DunningRepository, TrackingRepository};
use freightbook_shared::config::SchedulerConfig;

/// Periodic bulk tracking creation and dunning cycle.
pub struct Scheduler {
    trackings: TrackingRepository,
    dunning: DunningRepository,
    bulk_policy: BulkPolicy,
    period: Duration,
}

impl Scheduler {
    /// Creates a scheduler, or `None` when the interval is `0`.
    pub fn new(
        trackings: TrackingRepository,
        dunning: DunningRepository,
        bulk_policy: BulkPolicy,
        config: &SchedulerConfig,
    ) -> Option<Self> {
        if config.interval_secs == 0 {
            info!("Scheduler disabled");
            return None;
        }
        Some(Self {
            trackings,
            dunning,
            bulk_policy,
            period: Duration::from_secs(config.interval_secs),
        })
    }

    /// Runs until `shutdown` turns true.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.period.as_secs(), "Scheduler starting");
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => self.tick().await,
                _ = shutdown.changed() => break,
            }
        }

        info!("Scheduler stopped");
    }

    async fn tick(&self) {
        match self.trackings.bulk_create(self.bulk_policy).await {
            Ok(report) => info!(
                created = report.succeeded,
                skipped = report.skipped,
                failed = report.failed,
                "Bulk tracking run finished"
            ),
            Err(e) => error!(error = %e, "Bulk tracking run failed"),
        }

        match self.dunning.run_cycle().await {
            Ok(report) => info!(
                evaluated = report.succeeded,
                failed = report.failed,
                "Dunning cycle finished"
            ),
            Err(e) => error!(error = %e, "Dunning cycle failed"),
        }
    }
}
