//! Shared domain types for the certificate tracking service

pub mod actor;
pub mod certificate;
pub mod error;
pub mod region;

pub use actor::{Actor, Role};
pub use certificate::{
    is_valid_cnic, Certificate, CertificateFilter, CertificateStatus, NewCertificate,
    ReminderType, MAX_ESCALATION_LEVEL,
};
pub use error::{Result, TrackerError};
pub use region::Region;
