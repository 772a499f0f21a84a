//! Reminder sweep
//!
//! Walks pending certificates and sends the officer one reminder per
//! crossed threshold. Thresholds are evaluated ascending and the first
//! match wins; a threshold matches only while it is above the last
//! recorded one, so repeated sweeps never re-send a tier.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::db::{certificates, users, TrackerDb};
use crate::notify::Notifier;
use crate::types::{Certificate, CertificateStatus, ReminderType, Result, MAX_ESCALATION_LEVEL};

/// Reminder thresholds in ascending day order
pub const REMINDER_THRESHOLDS: [(u32, ReminderType); 3] = [
    (15, ReminderType::First),
    (21, ReminderType::Second),
    (30, ReminderType::Final),
];

/// A reminder sent by the sweep
#[derive(Debug, Clone)]
pub struct SentReminder {
    pub tracking_id: String,
    pub reminder: ReminderType,
    pub recipient: String,
}

/// Decide which reminder, if any, a certificate is due
///
/// Pure: the sweep applies the outcome with a guarded update.
pub fn reminder_due(cert: &Certificate, now: DateTime<Utc>) -> Option<(u32, ReminderType)> {
    if cert.status != CertificateStatus::Pending || cert.escalation_level >= MAX_ESCALATION_LEVEL {
        return None;
    }

    let days_pending = cert.days_pending(now);
    REMINDER_THRESHOLDS
        .iter()
        .find(|(day, _)| days_pending >= *day as i64 && cert.last_reminder_day < *day)
        .copied()
}

/// Run one reminder sweep over all candidates
///
/// Per-certificate failures are logged and the sweep continues; the
/// threshold is persisted before the notice goes out, so a notifier
/// failure costs one notice rather than a duplicate later.
pub async fn run_reminder_sweep(
    db: &Arc<TrackerDb>,
    notifier: &Arc<dyn Notifier>,
    now: DateTime<Utc>,
) -> Result<Vec<SentReminder>> {
    let candidates = db.with_conn(certificates::reminder_candidates)?;
    let mut sent = vec![];

    for cert in candidates {
        match process_candidate(db, notifier, &cert, now).await {
            Ok(Some(reminder)) => sent.push(reminder),
            Ok(None) => {}
            Err(e) => error!("Reminder sweep failed for {}: {}", cert.tracking_id, e),
        }
    }

    if !sent.is_empty() {
        info!("Sent {} reminders", sent.len());
    }

    Ok(sent)
}

async fn process_candidate(
    db: &Arc<TrackerDb>,
    notifier: &Arc<dyn Notifier>,
    cert: &Certificate,
    now: DateTime<Utc>,
) -> Result<Option<SentReminder>> {
    let Some((day, reminder)) = reminder_due(cert, now) else {
        return Ok(None);
    };

    // No recipient without an assigned officer
    let Some(officer_id) = cert.assigned_to.clone() else {
        debug!("Skipping reminder for unassigned {}", cert.tracking_id);
        return Ok(None);
    };
    let Some(officer) = db.with_conn(|conn| users::get(conn, &officer_id))? else {
        debug!("Officer {} for {} not found, skipping", officer_id, cert.tracking_id);
        return Ok(None);
    };

    // Guarded: if another sweep got here first this is a no-op
    let applied = db.with_conn(|conn| certificates::record_reminder(conn, &cert.id, day, now))?;
    if !applied {
        return Ok(None);
    }

    if let Err(e) = notifier
        .notify_reminder(cert, &officer, reminder, cert.days_pending(now))
        .await
    {
        warn!("Failed to send reminder notice for {}: {}", cert.tracking_id, e);
    }

    Ok(Some(SentReminder {
        tracking_id: cert.tracking_id.clone(),
        reminder,
        recipient: officer.email,
    }))
}
