//! Shared fixtures for integration tests
//!
//! Provides an in-memory store seeded with a region and the workflow
//! roles, a recording notifier double, and helpers for backdating
//! certificates so sweep scenarios don't have to wait out real days.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use certtrack::db::{certificates, regions, users, TrackerDb};
use certtrack::engine::{EngineConfig, LifecycleEngine};
use certtrack::notify::Notifier;
use certtrack::types::{
    Actor, Certificate, NewCertificate, Region, ReminderType, Role, TrackerError,
};

/// Admin distribution used by every harness engine
pub const ADMIN_EMAIL: &str = "ops@example.com";

/// A notice captured by the recording notifier
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Assignment {
        tracking_id: String,
        officer_email: String,
    },
    Reminder {
        tracking_id: String,
        reminder: ReminderType,
        officer_email: String,
    },
    Escalation {
        tracking_id: String,
        level: u8,
        recipients: Vec<String>,
    },
    Result {
        tracking_id: String,
        status: String,
        creator_email: String,
    },
}

/// Notifier double that records every notice in order
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    fn push(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_assignment(
        &self,
        cert: &Certificate,
        officer: &Actor,
    ) -> Result<(), TrackerError> {
        self.push(Notice::Assignment {
            tracking_id: cert.tracking_id.clone(),
            officer_email: officer.email.clone(),
        });
        Ok(())
    }

    async fn notify_reminder(
        &self,
        cert: &Certificate,
        officer: &Actor,
        reminder: ReminderType,
        _days_pending: i64,
    ) -> Result<(), TrackerError> {
        self.push(Notice::Reminder {
            tracking_id: cert.tracking_id.clone(),
            reminder,
            officer_email: officer.email.clone(),
        });
        Ok(())
    }

    async fn notify_escalation(
        &self,
        cert: &Certificate,
        recipients: &[String],
        _days_pending: i64,
    ) -> Result<(), TrackerError> {
        self.push(Notice::Escalation {
            tracking_id: cert.tracking_id.clone(),
            level: cert.escalation_level,
            recipients: recipients.to_vec(),
        });
        Ok(())
    }

    async fn notify_verification_result(
        &self,
        cert: &Certificate,
        creator: &Actor,
    ) -> Result<(), TrackerError> {
        self.push(Notice::Result {
            tracking_id: cert.tracking_id.clone(),
            status: cert.status.to_string(),
            creator_email: creator.email.clone(),
        });
        Ok(())
    }
}

/// Notifier double whose every send fails
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify_assignment(
        &self,
        _cert: &Certificate,
        _officer: &Actor,
    ) -> Result<(), TrackerError> {
        Err(TrackerError::Notify("transport down".to_string()))
    }

    async fn notify_reminder(
        &self,
        _cert: &Certificate,
        _officer: &Actor,
        _reminder: ReminderType,
        _days_pending: i64,
    ) -> Result<(), TrackerError> {
        Err(TrackerError::Notify("transport down".to_string()))
    }

    async fn notify_escalation(
        &self,
        _cert: &Certificate,
        _recipients: &[String],
        _days_pending: i64,
    ) -> Result<(), TrackerError> {
        Err(TrackerError::Notify("transport down".to_string()))
    }

    async fn notify_verification_result(
        &self,
        _cert: &Certificate,
        _creator: &Actor,
    ) -> Result<(), TrackerError> {
        Err(TrackerError::Notify("transport down".to_string()))
    }
}

/// Build an actor without touching the store
pub fn actor(id: &str, email: &str, role: Role, region_id: Option<&str>, beats: &[&str]) -> Actor {
    Actor {
        id: id.to_string(),
        name: id.to_string(),
        email: email.to_string(),
        role,
        region_id: region_id.map(String::from),
        beat_codes: beats.iter().map(|b| b.to_string()).collect(),
    }
}

/// In-memory store, engine and recording notifier with seeded fixtures
///
/// Regions: `r1` (code 2100) and `r2` (code 2200). Users: a section
/// officer as creator, two beat officers and a regional head, all in r1.
pub struct Harness {
    pub db: Arc<TrackerDb>,
    pub notifier: Arc<RecordingNotifier>,
    pub engine: LifecycleEngine,
    pub creator: Actor,
    pub officer: Actor,
    pub officer2: Actor,
    pub head: Actor,
}

impl Harness {
    pub fn new() -> Self {
        let db = Arc::new(TrackerDb::open_in_memory().unwrap());

        db.with_conn(|conn| {
            regions::insert(
                conn,
                &Region {
                    id: "r1".to_string(),
                    code: "2100".to_string(),
                    name: "Karachi".to_string(),
                },
            )?;
            regions::insert(
                conn,
                &Region {
                    id: "r2".to_string(),
                    code: "2200".to_string(),
                    name: "Lahore".to_string(),
                },
            )
        })
        .unwrap();

        let creator = actor("creator", "bts@example.com", Role::Bts, Some("r1"), &[]);
        let officer = actor(
            "officer-1",
            "officer1@example.com",
            Role::BeatOfficer,
            Some("r1"),
            &["B01", "B02"],
        );
        let officer2 = actor(
            "officer-2",
            "officer2@example.com",
            Role::BeatOfficer,
            Some("r1"),
            &["B01"],
        );
        let head = actor("head", "rh@example.com", Role::Rh, Some("r1"), &[]);

        for user in [&creator, &officer, &officer2, &head] {
            db.with_conn(|conn| users::insert(conn, user)).unwrap();
        }

        let notifier = Arc::new(RecordingNotifier::default());
        let engine = LifecycleEngine::new(
            Arc::clone(&db),
            notifier.clone(),
            EngineConfig {
                grace_days: 15,
                admin_emails: vec![ADMIN_EMAIL.to_string()],
            },
        );

        Self {
            db,
            notifier,
            engine,
            creator,
            officer,
            officer2,
            head,
        }
    }

    /// The recording notifier as the trait object the sweeps take
    pub fn dyn_notifier(&self) -> Arc<dyn Notifier> {
        self.notifier.clone()
    }

    /// Creation input for region r1
    pub fn input(&self, cnic: &str, beat_code: &str) -> NewCertificate {
        self.input_in("r1", cnic, beat_code)
    }

    pub fn input_in(&self, region_id: &str, cnic: &str, beat_code: &str) -> NewCertificate {
        NewCertificate {
            claimant_name: "Muhammad Aslam".to_string(),
            cnic: cnic.to_string(),
            beat_code: beat_code.to_string(),
            region_id: region_id.to_string(),
            ..Default::default()
        }
    }

    /// Insert a certificate created `days_old` days ago, bypassing the
    /// engine so sweep scenarios can age certificates freely
    pub fn create_backdated(&self, cnic: &str, beat_code: &str, days_old: i64) -> Certificate {
        let input = self.input(cnic, beat_code);
        let creator_id = self.creator.id.clone();
        let created = Utc::now() - Duration::days(days_old);
        self.db
            .with_conn_mut(|conn| certificates::create(conn, &input, &creator_id, 15, created))
            .unwrap()
    }

    /// Assign directly in the store, skipping the beat check
    pub fn assign_direct(&self, cert_id: &str, officer_id: &str) {
        let applied = self
            .db
            .with_conn(|conn| certificates::record_assignment(conn, cert_id, officer_id, Utc::now()))
            .unwrap();
        assert!(applied);
    }

    /// Raise a certificate to the given escalation level in the store
    pub fn set_level(&self, cert: &Certificate, level: u8) {
        let applied = self
            .db
            .with_conn(|conn| {
                certificates::record_escalation(
                    conn,
                    &cert.id,
                    level,
                    cert.status,
                    cert.escalation_level,
                    cert.status,
                    Utc::now(),
                )
            })
            .unwrap();
        assert!(applied);
    }

    /// Record a reminder threshold as already sent
    pub fn mark_reminded(&self, cert: &Certificate, day: u32) {
        let applied = self
            .db
            .with_conn(|conn| certificates::record_reminder(conn, &cert.id, day, Utc::now()))
            .unwrap();
        assert!(applied);
    }

    pub fn reload(&self, cert_id: &str) -> Certificate {
        self.db
            .with_conn(|conn| certificates::get(conn, cert_id))
            .unwrap()
            .unwrap()
    }
}
