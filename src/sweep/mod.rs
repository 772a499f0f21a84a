//! Periodic sweeps over pending certificates
//!
//! One scheduler drives both sweeps on a shared interval. Within a tick
//! the reminder sweep runs before the escalation sweep, so a certificate
//! crossing day 30 receives its final reminder before its warning-level
//! promotion. Both sweeps are idempotent: the send-once and level guards
//! make re-runs no-ops.

pub mod escalation;
pub mod reminder;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::db::TrackerDb;
use crate::notify::Notifier;
use crate::types::Result;

pub use escalation::{escalation_due, run_escalation_sweep, EscalationAction};
pub use reminder::{reminder_due, run_reminder_sweep, SentReminder};

/// Drives the reminder and escalation sweeps on a timer
pub struct SweepScheduler {
    db: Arc<TrackerDb>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    admin_emails: Vec<String>,
    /// Whether the scheduler loop is running
    running: Arc<RwLock<bool>>,
}

impl SweepScheduler {
    pub fn new(
        db: Arc<TrackerDb>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
        admin_emails: Vec<String>,
    ) -> Self {
        Self {
            db,
            notifier,
            interval,
            admin_emails,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Run both sweeps once, reminders first
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<()> {
        if let Err(e) = run_reminder_sweep(&self.db, &self.notifier, now).await {
            error!("Reminder sweep failed: {}", e);
        }
        if let Err(e) =
            run_escalation_sweep(&self.db, &self.notifier, &self.admin_emails, now).await
        {
            error!("Escalation sweep failed: {}", e);
        }
        Ok(())
    }

    /// Start the sweep loop
    pub async fn start(self: Arc<Self>) -> Result<()> {
        {
            let mut running = self.running.write().await;
            if *running {
                warn!("Sweep scheduler already running");
                return Ok(());
            }
            *running = true;
        }

        info!("Starting sweep scheduler (interval: {:?})", self.interval);

        let scheduler = Arc::clone(&self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(scheduler.interval);
            // The first tick fires immediately; skip it so startup isn't
            // also a sweep
            interval.tick().await;

            loop {
                interval.tick().await;

                if !*scheduler.running.read().await {
                    info!("Sweep scheduler stopped");
                    break;
                }

                if let Err(e) = scheduler.run_once(Utc::now()).await {
                    error!("Sweep tick failed: {}", e);
                }
            }
        });

        Ok(())
    }

    /// Stop the sweep loop
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        info!("Stopping sweep scheduler");
    }

    /// Check if the scheduler is running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}
