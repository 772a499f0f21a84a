//! Certificate domain types
//!
//! The central entity of the tracking workflow plus the input and filter
//! shapes used around it. Subject data (claimant, employer, CNIC) is opaque
//! to the lifecycle engine and carried as-is.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::TrackerError;

/// Workflow status of a certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateStatus {
    /// Awaiting field verification
    Pending,
    /// Verified by the assigned beat officer (terminal)
    Verified,
    /// Rejected by the assigned beat officer (terminal)
    Rejected,
    /// Overdue past the final escalation threshold
    Escalated,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Pending => "Pending",
            CertificateStatus::Verified => "Verified",
            CertificateStatus::Rejected => "Rejected",
            CertificateStatus::Escalated => "Escalated",
        }
    }

    /// Terminal states block all further lifecycle transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, CertificateStatus::Verified | CertificateStatus::Rejected)
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(CertificateStatus::Pending),
            "Verified" => Ok(CertificateStatus::Verified),
            "Rejected" => Ok(CertificateStatus::Rejected),
            "Escalated" => Ok(CertificateStatus::Escalated),
            other => Err(TrackerError::Internal(format!(
                "Unknown certificate status '{}'",
                other
            ))),
        }
    }
}

/// Reminder tier sent to the assigned officer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderType {
    First,
    Second,
    Final,
}

impl fmt::Display for ReminderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReminderType::First => write!(f, "First"),
            ReminderType::Second => write!(f, "Second"),
            ReminderType::Final => write!(f, "Final"),
        }
    }
}

/// Highest escalation level; reaching it promotes status to Escalated
pub const MAX_ESCALATION_LEVEL: u8 = 3;

/// A verification certificate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    /// Internal identity
    pub id: String,
    /// External identity, `REGIONCODE-BEATCODE-SEQ`, immutable
    pub tracking_id: String,
    /// Owning region, immutable after creation
    pub region_id: String,
    /// Beat the certificate is routed through, immutable after creation
    pub beat_code: String,

    // Subject data, opaque to the lifecycle engine
    pub claimant_name: String,
    pub father_name: Option<String>,
    pub fir_number: Option<String>,
    pub eobi_number: Option<String>,
    pub cnic: String,
    pub employer_name: Option<String>,
    pub employer_main_code: Option<String>,
    pub employer_sub_code: Option<String>,

    // Workflow fields
    pub status: CertificateStatus,
    /// Creator, required
    pub assigned_by: String,
    /// Assigned field officer, set by assignment
    pub assigned_to: Option<String>,
    pub due_date: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub evidence_ref: Option<String>,
    pub rejection_reason: Option<String>,
    /// 0..=3, monotonically non-decreasing
    pub escalation_level: u8,
    /// Day-count of the last reminder threshold sent, 0 = none yet
    pub last_reminder_day: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Certificate {
    /// Whole days elapsed since creation
    pub fn days_pending(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Input for creating a certificate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCertificate {
    pub claimant_name: String,
    pub cnic: String,
    pub beat_code: String,
    pub region_id: String,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub fir_number: Option<String>,
    #[serde(default)]
    pub eobi_number: Option<String>,
    #[serde(default)]
    pub employer_name: Option<String>,
    #[serde(default)]
    pub employer_main_code: Option<String>,
    #[serde(default)]
    pub employer_sub_code: Option<String>,
}

/// Query filter for listing certificates
///
/// An empty `beat_codes` means no beat restriction. The access policy
/// evaluator rescopes or rejects a filter before it reaches the store.
#[derive(Debug, Clone, Default)]
pub struct CertificateFilter {
    pub status: Option<CertificateStatus>,
    pub region_id: Option<String>,
    pub beat_codes: Vec<String>,
}

static CNIC_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Check the national identity number format `#####-#######-#`
pub fn is_valid_cnic(cnic: &str) -> bool {
    let re = CNIC_PATTERN
        .get_or_init(|| Regex::new(r"^[0-9]{5}-[0-9]{7}-[0-9]$").expect("CNIC pattern compiles"));
    re.is_match(cnic)
}
