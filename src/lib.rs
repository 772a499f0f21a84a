//! Certtrack - verification certificate tracking service
//!
//! Tracks verification certificates through a multi-role approval
//! workflow: creation, assignment, field verification or rejection,
//! reminders and escalation.
//!
//! ## Components
//!
//! - **Engine**: the lifecycle state machine (create, assign, verify,
//!   reject, escalate, remind)
//! - **Sweeps**: timer-driven reminder and escalation passes over
//!   pending certificates
//! - **Access**: role/region/beat policy evaluation
//! - **Store**: SQLite-backed certificates, regions and users
//! - **Notify**: fire-and-forget notices over NATS or the log

pub mod access;
pub mod config;
pub mod db;
pub mod engine;
pub mod evidence;
pub mod notify;
pub mod provision;
pub mod sweep;
pub mod tracking;
pub mod types;

pub use config::Args;
pub use db::TrackerDb;
pub use engine::{EngineConfig, LifecycleEngine};
pub use evidence::{EvidenceStore, FsEvidenceStore};
pub use notify::{LogNotifier, NatsNotifier, Notifier};
pub use sweep::SweepScheduler;
pub use types::{Result, TrackerError};
