//! Certificate lifecycle engine
//!
//! Executes the status transitions: create, assign, verify, reject,
//! manual escalation and manual reminder, plus policy-scoped reads.
//! Every transition is a precondition read followed by a guarded UPDATE
//! inside the store lock; a guard miss after a successful read means a
//! concurrent writer won and the operation reports an invalid transition
//! instead of clobbering state.
//!
//! Notifications go out only after the transition has committed and are
//! fire-and-forget: a notifier failure is logged, never propagated.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::access::{self, Operation};
use crate::db::{certificates, users, TrackerDb};
use crate::notify::Notifier;
use crate::sweep::escalation::ESCALATION_OVERDUE_DAYS;
use crate::sweep::reminder::REMINDER_THRESHOLDS;
use crate::types::{
    is_valid_cnic, Actor, Certificate, CertificateFilter, CertificateStatus, NewCertificate,
    ReminderType, Result, Role, TrackerError, MAX_ESCALATION_LEVEL,
};

/// Engine settings fixed at startup
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Days until a new certificate is due
    pub grace_days: i64,
    /// Always-notified escalation recipients
    pub admin_emails: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grace_days: 15,
            admin_emails: vec![],
        }
    }
}

/// Outcome of a manual reminder
#[derive(Debug, Clone)]
pub struct ReminderReceipt {
    pub tracking_id: String,
    pub reminder: ReminderType,
    pub days_pending: i64,
    pub recipient: String,
}

/// The certificate lifecycle engine
pub struct LifecycleEngine {
    db: Arc<TrackerDb>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
}

impl LifecycleEngine {
    pub fn new(db: Arc<TrackerDb>, notifier: Arc<dyn Notifier>, config: EngineConfig) -> Self {
        Self {
            db,
            notifier,
            config,
        }
    }

    fn load(&self, certificate_id: &str) -> Result<Certificate> {
        self.db
            .with_conn(|conn| certificates::get(conn, certificate_id))?
            .ok_or_else(|| TrackerError::NotFound(format!("Certificate {}", certificate_id)))
    }

    fn load_user(&self, user_id: &str) -> Result<Actor> {
        self.db
            .with_conn(|conn| users::get(conn, user_id))?
            .ok_or_else(|| TrackerError::NotFound(format!("User {}", user_id)))
    }

    /// Create a certificate
    ///
    /// Validates the subject data, then allocates the tracking id and
    /// inserts the row in one transaction.
    pub async fn create(&self, input: NewCertificate, creator: &Actor) -> Result<Certificate> {
        access::check_operation(creator.role, Operation::Create)?;

        if input.claimant_name.trim().is_empty() {
            return Err(TrackerError::Validation("Claimant name is required".to_string()));
        }
        if input.beat_code.trim().is_empty() {
            return Err(TrackerError::Validation("Beat code is required".to_string()));
        }
        if input.region_id.trim().is_empty() {
            return Err(TrackerError::Validation("Region is required".to_string()));
        }
        if !is_valid_cnic(&input.cnic) {
            return Err(TrackerError::Validation(format!(
                "CNIC '{}' does not match the #####-#######-# format",
                input.cnic
            )));
        }

        let grace_days = self.config.grace_days;
        let creator_id = creator.id.clone();
        let cert = self
            .db
            .with_conn_mut(|conn| certificates::create(conn, &input, &creator_id, grace_days, Utc::now()))?;

        info!("Created certificate {} in beat {}", cert.tracking_id, cert.beat_code);
        Ok(cert)
    }

    /// Assign a certificate to a field officer
    ///
    /// Re-assignment overwrites while the certificate is non-terminal;
    /// the last assignment wins.
    pub async fn assign(
        &self,
        certificate_id: &str,
        officer_id: &str,
        actor: &Actor,
    ) -> Result<Certificate> {
        access::check_operation(actor.role, Operation::Assign)?;

        let cert = self.load(certificate_id)?;
        access::check_access(actor, &cert)?;

        if cert.is_terminal() {
            return Err(TrackerError::InvalidTransition(format!(
                "Certificate {} is already {}",
                cert.tracking_id, cert.status
            )));
        }

        let officer = self.load_user(officer_id)?;
        if officer.role != Role::BeatOfficer {
            return Err(TrackerError::Validation(format!(
                "User {} is not a beat officer",
                officer_id
            )));
        }
        if !officer.has_beat(&cert.beat_code) {
            return Err(TrackerError::BeatMismatch(format!(
                "Officer {} is not assigned to beat {}",
                officer.name, cert.beat_code
            )));
        }

        let applied = self
            .db
            .with_conn(|conn| certificates::record_assignment(conn, &cert.id, &officer.id, Utc::now()))?;
        if !applied {
            return Err(TrackerError::InvalidTransition(format!(
                "Certificate {} changed state during assignment",
                cert.tracking_id
            )));
        }

        let cert = self.load(certificate_id)?;
        info!("Assigned {} to officer {}", cert.tracking_id, officer.name);

        if let Err(e) = self.notifier.notify_assignment(&cert, &officer).await {
            warn!("Failed to send assignment notice for {}: {}", cert.tracking_id, e);
        }

        Ok(cert)
    }

    /// Verify a certificate with stored evidence
    pub async fn verify(
        &self,
        certificate_id: &str,
        evidence_ref: &str,
        actor: &Actor,
    ) -> Result<Certificate> {
        access::check_operation(actor.role, Operation::Verify)?;

        let cert = self.load(certificate_id)?;
        access::check_access(actor, &cert)?;
        self.check_conclusion_preconditions(&cert, actor)?;

        if evidence_ref.trim().is_empty() {
            return Err(TrackerError::Validation("Evidence reference is required".to_string()));
        }

        let applied = self.db.with_conn(|conn| {
            certificates::record_verification(conn, &cert.id, evidence_ref, &actor.id, Utc::now())
        })?;
        if !applied {
            return Err(TrackerError::InvalidTransition(format!(
                "Certificate {} changed state during verification",
                cert.tracking_id
            )));
        }

        let cert = self.load(certificate_id)?;
        info!("Verified certificate {}", cert.tracking_id);

        self.notify_result(&cert).await;
        Ok(cert)
    }

    /// Reject a certificate with a reason
    pub async fn reject(
        &self,
        certificate_id: &str,
        reason: &str,
        actor: &Actor,
    ) -> Result<Certificate> {
        access::check_operation(actor.role, Operation::Reject)?;

        let cert = self.load(certificate_id)?;
        access::check_access(actor, &cert)?;
        self.check_conclusion_preconditions(&cert, actor)?;

        if reason.trim().is_empty() {
            return Err(TrackerError::Validation("Rejection reason is required".to_string()));
        }

        let applied = self.db.with_conn(|conn| {
            certificates::record_rejection(conn, &cert.id, reason, &actor.id, Utc::now())
        })?;
        if !applied {
            return Err(TrackerError::InvalidTransition(format!(
                "Certificate {} changed state during rejection",
                cert.tracking_id
            )));
        }

        let cert = self.load(certificate_id)?;
        info!("Rejected certificate {}: {}", cert.tracking_id, reason);

        self.notify_result(&cert).await;
        Ok(cert)
    }

    /// Shared preconditions for verify and reject
    fn check_conclusion_preconditions(&self, cert: &Certificate, actor: &Actor) -> Result<()> {
        if !matches!(
            cert.status,
            CertificateStatus::Pending | CertificateStatus::Escalated
        ) {
            return Err(TrackerError::InvalidTransition(format!(
                "Certificate {} is already {}",
                cert.tracking_id, cert.status
            )));
        }

        match cert.assigned_to {
            None => Err(TrackerError::NotAssigned(format!(
                "Certificate {} has no assigned officer",
                cert.tracking_id
            ))),
            Some(ref assigned) if *assigned != actor.id => Err(TrackerError::Forbidden(format!(
                "Certificate {} is assigned to another officer",
                cert.tracking_id
            ))),
            Some(_) => Ok(()),
        }
    }

    /// Manually escalate a certificate by one level
    ///
    /// The level is capped; status is promoted to Escalated only when the
    /// certificate is also past the overdue threshold. A certificate at
    /// the cap or in a terminal state is returned unchanged.
    pub async fn escalate(&self, certificate_id: &str, actor: &Actor) -> Result<Certificate> {
        access::check_operation(actor.role, Operation::Escalate)?;

        let cert = self.load(certificate_id)?;
        access::check_access(actor, &cert)?;

        if cert.is_terminal() || cert.escalation_level >= MAX_ESCALATION_LEVEL {
            return Ok(cert);
        }

        let now = Utc::now();
        let days_pending = cert.days_pending(now);
        let new_level = (cert.escalation_level + 1).min(MAX_ESCALATION_LEVEL);
        let new_status = if days_pending >= ESCALATION_OVERDUE_DAYS {
            CertificateStatus::Escalated
        } else {
            cert.status
        };

        let applied = self.db.with_conn(|conn| {
            certificates::record_escalation(
                conn,
                &cert.id,
                new_level,
                new_status,
                cert.escalation_level,
                cert.status,
                now,
            )
        })?;
        if !applied {
            return Err(TrackerError::InvalidTransition(format!(
                "Certificate {} changed state during escalation",
                cert.tracking_id
            )));
        }

        let cert = self.load(certificate_id)?;
        info!(
            "Escalated {} to level {} after {} days",
            cert.tracking_id, cert.escalation_level, days_pending
        );

        let recipients =
            crate::sweep::escalation::escalation_recipients(&self.db, &cert, &self.config.admin_emails)?;
        if let Err(e) = self
            .notifier
            .notify_escalation(&cert, &recipients, days_pending)
            .await
        {
            warn!("Failed to send escalation notice for {}: {}", cert.tracking_id, e);
        }

        Ok(cert)
    }

    /// Manually send a reminder for one certificate
    ///
    /// Picks the reminder tier from elapsed days with the same thresholds
    /// as the sweep, but deliberately skips the send-once guard.
    pub async fn remind(&self, certificate_id: &str, actor: &Actor) -> Result<ReminderReceipt> {
        access::check_operation(actor.role, Operation::Remind)?;

        let cert = self.load(certificate_id)?;
        access::check_access(actor, &cert)?;

        let officer_id = cert.assigned_to.clone().ok_or_else(|| {
            TrackerError::NotAssigned(format!(
                "Certificate {} has no assigned officer",
                cert.tracking_id
            ))
        })?;
        let officer = self.load_user(&officer_id)?;

        let now = Utc::now();
        let days_pending = cert.days_pending(now);
        let (day, reminder) = REMINDER_THRESHOLDS
            .iter()
            .rev()
            .find(|(d, _)| days_pending >= *d as i64)
            .copied()
            .unwrap_or(REMINDER_THRESHOLDS[0]);

        self.db
            .with_conn(|conn| certificates::record_reminder_override(conn, &cert.id, day, now))?;

        if let Err(e) = self
            .notifier
            .notify_reminder(&cert, &officer, reminder, days_pending)
            .await
        {
            warn!("Failed to send reminder notice for {}: {}", cert.tracking_id, e);
        }

        Ok(ReminderReceipt {
            tracking_id: cert.tracking_id,
            reminder,
            days_pending,
            recipient: officer.email,
        })
    }

    /// List certificates the actor may see, newest first
    pub fn list(&self, filter: &CertificateFilter, actor: &Actor) -> Result<Vec<Certificate>> {
        let scoped = access::scope_filter(actor, filter)?;
        self.db.with_conn(|conn| certificates::list(conn, &scoped))
    }

    /// Fetch one certificate, policy-checked
    pub fn get(&self, certificate_id: &str, actor: &Actor) -> Result<Certificate> {
        let cert = self.load(certificate_id)?;
        access::check_access(actor, &cert)?;
        Ok(cert)
    }

    async fn notify_result(&self, cert: &Certificate) {
        let creator = match self.db.with_conn(|conn| users::get(conn, &cert.assigned_by)) {
            Ok(Some(creator)) => creator,
            Ok(None) => {
                warn!("Creator {} of {} not found, skipping result notice", cert.assigned_by, cert.tracking_id);
                return;
            }
            Err(e) => {
                warn!("Failed to load creator for {}: {}", cert.tracking_id, e);
                return;
            }
        };

        if let Err(e) = self.notifier.notify_verification_result(cert, &creator).await {
            warn!("Failed to send result notice for {}: {}", cert.tracking_id, e);
        }
    }
}
