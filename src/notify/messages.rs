//! Notification message types
//!
//! Typed notices published to the messaging fabric. Downstream consumers
//! (mail bridge, dashboards) subscribe by subject and render delivery
//! however they like; the tracking service only publishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Actor, Certificate, ReminderType};

/// Subject prefix for certificate workflow notices
pub const NOTIFY_SUBJECT_PREFIX: &str = "CERT.NOTIFY";

/// Notice that a certificate was assigned to a field officer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentNotice {
    pub tracking_id: String,
    pub claimant_name: String,
    pub beat_code: String,
    pub due_date: DateTime<Utc>,
    pub officer_name: String,
    pub officer_email: String,
}

impl AssignmentNotice {
    pub fn new(cert: &Certificate, officer: &Actor) -> Self {
        Self {
            tracking_id: cert.tracking_id.clone(),
            claimant_name: cert.claimant_name.clone(),
            beat_code: cert.beat_code.clone(),
            due_date: cert.due_date,
            officer_name: officer.name.clone(),
            officer_email: officer.email.clone(),
        }
    }

    pub fn subject() -> &'static str {
        "CERT.NOTIFY.ASSIGNMENT"
    }

    pub fn to_bytes(&self) -> Result<bytes::Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Into::into)
    }
}

/// Reminder notice for a pending certificate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderNotice {
    pub tracking_id: String,
    pub claimant_name: String,
    pub reminder: ReminderType,
    pub days_pending: i64,
    pub officer_name: String,
    pub officer_email: String,
}

impl ReminderNotice {
    pub fn new(cert: &Certificate, officer: &Actor, reminder: ReminderType, days_pending: i64) -> Self {
        Self {
            tracking_id: cert.tracking_id.clone(),
            claimant_name: cert.claimant_name.clone(),
            reminder,
            days_pending,
            officer_name: officer.name.clone(),
            officer_email: officer.email.clone(),
        }
    }

    pub fn subject() -> &'static str {
        "CERT.NOTIFY.REMINDER"
    }

    pub fn to_bytes(&self) -> Result<bytes::Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Into::into)
    }
}

/// Escalation notice sent to the oversight distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationNotice {
    pub tracking_id: String,
    pub claimant_name: String,
    pub cnic: String,
    pub escalation_level: u8,
    pub days_pending: i64,
    /// Region head, creator and admin distribution emails
    pub recipients: Vec<String>,
}

impl EscalationNotice {
    pub fn new(cert: &Certificate, recipients: Vec<String>, days_pending: i64) -> Self {
        Self {
            tracking_id: cert.tracking_id.clone(),
            claimant_name: cert.claimant_name.clone(),
            cnic: cert.cnic.clone(),
            escalation_level: cert.escalation_level,
            days_pending,
            recipients,
        }
    }

    pub fn subject() -> &'static str {
        "CERT.NOTIFY.ESCALATION"
    }

    pub fn to_bytes(&self) -> Result<bytes::Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Into::into)
    }
}

/// Verification outcome notice sent back to the creator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResultNotice {
    pub tracking_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub creator_name: String,
    pub creator_email: String,
}

impl VerificationResultNotice {
    pub fn new(cert: &Certificate, creator: &Actor) -> Self {
        Self {
            tracking_id: cert.tracking_id.clone(),
            status: cert.status.to_string(),
            evidence_ref: cert.evidence_ref.clone(),
            rejection_reason: cert.rejection_reason.clone(),
            creator_name: creator.name.clone(),
            creator_email: creator.email.clone(),
        }
    }

    pub fn subject() -> &'static str {
        "CERT.NOTIFY.RESULT"
    }

    pub fn to_bytes(&self) -> Result<bytes::Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Into::into)
    }
}
