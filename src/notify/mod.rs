//! Notification collaborators
//!
//! The lifecycle engine and sweeps call a [`Notifier`] after a transition
//! has committed. Notification is fire-and-forget: failures are logged at
//! the call site and never roll back or fail the triggering operation.

pub mod client;
pub mod messages;

use async_trait::async_trait;
use tracing::info;

use crate::types::{Actor, Certificate, ReminderType, TrackerError};

pub use client::NatsClient;
pub use messages::{
    AssignmentNotice, EscalationNotice, ReminderNotice, VerificationResultNotice,
};

/// Outbound notification seam
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A certificate was assigned to a field officer
    async fn notify_assignment(
        &self,
        cert: &Certificate,
        officer: &Actor,
    ) -> Result<(), TrackerError>;

    /// A pending certificate crossed a reminder threshold
    async fn notify_reminder(
        &self,
        cert: &Certificate,
        officer: &Actor,
        reminder: ReminderType,
        days_pending: i64,
    ) -> Result<(), TrackerError>;

    /// A certificate was escalated; recipients are resolved by the caller
    async fn notify_escalation(
        &self,
        cert: &Certificate,
        recipients: &[String],
        days_pending: i64,
    ) -> Result<(), TrackerError>;

    /// A certificate reached a verification outcome
    async fn notify_verification_result(
        &self,
        cert: &Certificate,
        creator: &Actor,
    ) -> Result<(), TrackerError>;
}

/// Publishes notices to NATS subjects
pub struct NatsNotifier {
    client: NatsClient,
}

impl NatsNotifier {
    pub fn new(client: NatsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for NatsNotifier {
    async fn notify_assignment(
        &self,
        cert: &Certificate,
        officer: &Actor,
    ) -> Result<(), TrackerError> {
        let notice = AssignmentNotice::new(cert, officer);
        let payload = notice
            .to_bytes()
            .map_err(|e| TrackerError::Notify(format!("Failed to serialize notice: {}", e)))?;
        self.client.publish(AssignmentNotice::subject(), payload).await
    }

    async fn notify_reminder(
        &self,
        cert: &Certificate,
        officer: &Actor,
        reminder: ReminderType,
        days_pending: i64,
    ) -> Result<(), TrackerError> {
        let notice = ReminderNotice::new(cert, officer, reminder, days_pending);
        let payload = notice
            .to_bytes()
            .map_err(|e| TrackerError::Notify(format!("Failed to serialize notice: {}", e)))?;
        self.client.publish(ReminderNotice::subject(), payload).await
    }

    async fn notify_escalation(
        &self,
        cert: &Certificate,
        recipients: &[String],
        days_pending: i64,
    ) -> Result<(), TrackerError> {
        let notice = EscalationNotice::new(cert, recipients.to_vec(), days_pending);
        let payload = notice
            .to_bytes()
            .map_err(|e| TrackerError::Notify(format!("Failed to serialize notice: {}", e)))?;
        self.client.publish(EscalationNotice::subject(), payload).await
    }

    async fn notify_verification_result(
        &self,
        cert: &Certificate,
        creator: &Actor,
    ) -> Result<(), TrackerError> {
        let notice = VerificationResultNotice::new(cert, creator);
        let payload = notice
            .to_bytes()
            .map_err(|e| TrackerError::Notify(format!("Failed to serialize notice: {}", e)))?;
        self.client
            .publish(VerificationResultNotice::subject(), payload)
            .await
    }
}

/// Logs notices instead of publishing them
///
/// Used when NATS is not configured, so the rest of the service behaves
/// identically in development.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_assignment(
        &self,
        cert: &Certificate,
        officer: &Actor,
    ) -> Result<(), TrackerError> {
        info!(
            "Assignment notice: {} -> {} <{}>",
            cert.tracking_id, officer.name, officer.email
        );
        Ok(())
    }

    async fn notify_reminder(
        &self,
        cert: &Certificate,
        officer: &Actor,
        reminder: ReminderType,
        days_pending: i64,
    ) -> Result<(), TrackerError> {
        info!(
            "{} reminder: {} pending {} days, officer {} <{}>",
            reminder, cert.tracking_id, days_pending, officer.name, officer.email
        );
        Ok(())
    }

    async fn notify_escalation(
        &self,
        cert: &Certificate,
        recipients: &[String],
        days_pending: i64,
    ) -> Result<(), TrackerError> {
        info!(
            "Escalation notice: {} level {} after {} days -> {}",
            cert.tracking_id,
            cert.escalation_level,
            days_pending,
            recipients.join(", ")
        );
        Ok(())
    }

    async fn notify_verification_result(
        &self,
        cert: &Certificate,
        creator: &Actor,
    ) -> Result<(), TrackerError> {
        info!(
            "Result notice: {} is {} -> {} <{}>",
            cert.tracking_id, cert.status, creator.name, creator.email
        );
        Ok(())
    }
}
