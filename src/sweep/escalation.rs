//! Escalation sweep
//!
//! Promotes overdue pending certificates through escalation levels. The
//! larger threshold takes precedence and a certificate escalates at most
//! once per sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::db::{certificates, users, TrackerDb};
use crate::notify::Notifier;
use crate::types::{Certificate, CertificateStatus, Result, MAX_ESCALATION_LEVEL};

/// Days after which a certificate is fully escalated
pub const ESCALATION_OVERDUE_DAYS: i64 = 45;

/// Days after which a certificate reaches the warning level
pub const ESCALATION_WARNING_DAYS: i64 = 30;

/// Escalation level applied at the warning threshold
pub const WARNING_LEVEL: u8 = 2;

/// Escalation decided for one certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationAction {
    pub level: u8,
    pub status: CertificateStatus,
}

/// Decide whether a certificate escalates, and to what
///
/// Pure: the sweep applies the outcome with a guarded update. Only the
/// highest applicable threshold is returned.
pub fn escalation_due(cert: &Certificate, now: DateTime<Utc>) -> Option<EscalationAction> {
    if cert.status != CertificateStatus::Pending {
        return None;
    }

    let days_pending = cert.days_pending(now);
    if days_pending >= ESCALATION_OVERDUE_DAYS && cert.escalation_level < MAX_ESCALATION_LEVEL {
        Some(EscalationAction {
            level: MAX_ESCALATION_LEVEL,
            status: CertificateStatus::Escalated,
        })
    } else if days_pending >= ESCALATION_WARNING_DAYS && cert.escalation_level < WARNING_LEVEL {
        Some(EscalationAction {
            level: WARNING_LEVEL,
            status: CertificateStatus::Pending,
        })
    } else {
        None
    }
}

/// Run one escalation sweep over all pending certificates
///
/// Per-certificate failures are logged and the sweep continues.
pub async fn run_escalation_sweep(
    db: &Arc<TrackerDb>,
    notifier: &Arc<dyn Notifier>,
    admin_emails: &[String],
    now: DateTime<Utc>,
) -> Result<Vec<String>> {
    let candidates = db.with_conn(certificates::escalation_candidates)?;
    let mut escalated = vec![];

    for cert in candidates {
        match process_candidate(db, notifier, admin_emails, &cert, now).await {
            Ok(true) => escalated.push(cert.tracking_id.clone()),
            Ok(false) => {}
            Err(e) => error!("Escalation sweep failed for {}: {}", cert.tracking_id, e),
        }
    }

    if !escalated.is_empty() {
        info!("Processed {} escalations: {:?}", escalated.len(), escalated);
    }

    Ok(escalated)
}

async fn process_candidate(
    db: &Arc<TrackerDb>,
    notifier: &Arc<dyn Notifier>,
    admin_emails: &[String],
    cert: &Certificate,
    now: DateTime<Utc>,
) -> Result<bool> {
    let Some(action) = escalation_due(cert, now) else {
        return Ok(false);
    };

    // Guarded on the level and status the decision was based on
    let applied = db.with_conn(|conn| {
        certificates::record_escalation(
            conn,
            &cert.id,
            action.level,
            action.status,
            cert.escalation_level,
            cert.status,
            now,
        )
    })?;
    if !applied {
        return Ok(false);
    }

    let updated = db
        .with_conn(|conn| certificates::get(conn, &cert.id))?
        .unwrap_or_else(|| cert.clone());

    let recipients = escalation_recipients(db, cert, admin_emails)?;
    if let Err(e) = notifier
        .notify_escalation(&updated, &recipients, cert.days_pending(now))
        .await
    {
        warn!("Failed to send escalation notice for {}: {}", cert.tracking_id, e);
    }

    Ok(true)
}

/// Region head, creator and the admin distribution
pub fn escalation_recipients(
    db: &Arc<TrackerDb>,
    cert: &Certificate,
    admin_emails: &[String],
) -> Result<Vec<String>> {
    let mut recipients: Vec<String> = admin_emails.to_vec();

    if let Some(head) = db.with_conn(|conn| users::find_region_head(conn, &cert.region_id))? {
        if !recipients.contains(&head.email) {
            recipients.push(head.email);
        }
    }

    if let Some(creator) = db.with_conn(|conn| users::get(conn, &cert.assigned_by))? {
        if !recipients.contains(&creator.email) {
            recipients.push(creator.email);
        }
    }

    Ok(recipients)
}
