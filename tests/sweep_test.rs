//! Reminder and escalation sweep integration tests
//!
//! Ages certificates by backdating their creation in the store, then
//! drives the sweeps directly:
//! - once-per-threshold reminder semantics under repeated sweeps
//! - tier progression and the no-skip rule for late starters
//! - warning and overdue escalation with recipient resolution
//! - reminder-before-escalation ordering within one scheduler tick
//! - per-certificate failure isolation

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use certtrack::sweep::{run_escalation_sweep, run_reminder_sweep, SweepScheduler};
use certtrack::types::{CertificateStatus, ReminderType};

use common::{Harness, Notice, ADMIN_EMAIL};

// =============================================================================
// Reminder Sweep
// =============================================================================

#[tokio::test]
async fn test_first_reminder_sent_once_across_sweeps() {
    let h = Harness::new();
    let cert = h.create_backdated("11111-1111111-1", "B01", 16);
    h.assign_direct(&cert.id, &h.officer.id);

    let notifier = h.dyn_notifier();
    let now = Utc::now();

    let sent = run_reminder_sweep(&h.db, &notifier, now).await.unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].reminder, ReminderType::First);
    assert_eq!(sent[0].recipient, h.officer.email);

    // Re-running is a no-op thanks to the recorded threshold
    let again = run_reminder_sweep(&h.db, &notifier, now).await.unwrap();
    assert!(again.is_empty());

    assert_eq!(h.reload(&cert.id).last_reminder_day, 15);
    let reminders: Vec<Notice> = h
        .notifier
        .notices()
        .into_iter()
        .filter(|n| matches!(n, Notice::Reminder { .. }))
        .collect();
    assert_eq!(reminders.len(), 1);
}

#[tokio::test]
async fn test_reminder_tiers_follow_recorded_threshold() {
    let h = Harness::new();

    let second = h.create_backdated("11111-1111111-1", "B01", 22);
    h.assign_direct(&second.id, &h.officer.id);
    h.mark_reminded(&second, 15);

    let final_tier = h.create_backdated("22222-2222222-2", "B01", 31);
    h.assign_direct(&final_tier.id, &h.officer.id);
    h.mark_reminded(&final_tier, 15);
    h.mark_reminded(&final_tier, 21);

    // Never reminded: tiers are not skipped however late the start
    let late_start = h.create_backdated("33333-3333333-3", "B01", 31);
    h.assign_direct(&late_start.id, &h.officer.id);

    let sent = run_reminder_sweep(&h.db, &h.dyn_notifier(), Utc::now())
        .await
        .unwrap();
    let by_tracking: HashMap<String, ReminderType> = sent
        .iter()
        .map(|s| (s.tracking_id.clone(), s.reminder))
        .collect();

    assert_eq!(by_tracking[&second.tracking_id], ReminderType::Second);
    assert_eq!(by_tracking[&final_tier.tracking_id], ReminderType::Final);
    assert_eq!(by_tracking[&late_start.tracking_id], ReminderType::First);
}

#[tokio::test]
async fn test_unassigned_certificates_are_skipped() {
    let h = Harness::new();
    let cert = h.create_backdated("11111-1111111-1", "B01", 20);

    let sent = run_reminder_sweep(&h.db, &h.dyn_notifier(), Utc::now())
        .await
        .unwrap();
    assert!(sent.is_empty());
    assert!(h.notifier.notices().is_empty());

    // The threshold stays unrecorded until there is a recipient
    assert_eq!(h.reload(&cert.id).last_reminder_day, 0);
}

#[tokio::test]
async fn test_missing_officer_does_not_stall_the_sweep() {
    let h = Harness::new();
    let ghost = h.create_backdated("11111-1111111-1", "B01", 16);
    h.assign_direct(&ghost.id, "no-such-user");
    let healthy = h.create_backdated("22222-2222222-2", "B01", 16);
    h.assign_direct(&healthy.id, &h.officer2.id);

    let sent = run_reminder_sweep(&h.db, &h.dyn_notifier(), Utc::now())
        .await
        .unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].tracking_id, healthy.tracking_id);

    // The skipped certificate keeps its turn for a later sweep
    assert_eq!(h.reload(&ghost.id).last_reminder_day, 0);
}

// =============================================================================
// Escalation Sweep
// =============================================================================

#[tokio::test]
async fn test_overdue_certificate_fully_escalates_once() {
    let h = Harness::new();
    let cert = h.create_backdated("11111-1111111-1", "B01", 46);
    h.set_level(&cert, 1);

    let admins = vec![ADMIN_EMAIL.to_string()];
    let escalated = run_escalation_sweep(&h.db, &h.dyn_notifier(), &admins, Utc::now())
        .await
        .unwrap();
    assert_eq!(escalated, vec![cert.tracking_id.clone()]);

    let stored = h.reload(&cert.id);
    assert_eq!(stored.escalation_level, 3);
    assert_eq!(stored.status, CertificateStatus::Escalated);

    let notices = h.notifier.notices();
    assert_eq!(notices.len(), 1);
    match &notices[0] {
        Notice::Escalation {
            level, recipients, ..
        } => {
            assert_eq!(*level, 3);
            assert!(recipients.contains(&ADMIN_EMAIL.to_string()));
            assert!(recipients.contains(&h.head.email));
            assert!(recipients.contains(&h.creator.email));
        }
        other => panic!("unexpected notice {:?}", other),
    }

    // Fully escalated certificates leave the pending queue
    let again = run_escalation_sweep(&h.db, &h.dyn_notifier(), &admins, Utc::now())
        .await
        .unwrap();
    assert!(again.is_empty());
    assert_eq!(h.notifier.notices().len(), 1);
}

#[tokio::test]
async fn test_warning_threshold_applies_level_two() {
    let h = Harness::new();
    let cert = h.create_backdated("11111-1111111-1", "B01", 31);

    let admins = vec![ADMIN_EMAIL.to_string()];
    let escalated = run_escalation_sweep(&h.db, &h.dyn_notifier(), &admins, Utc::now())
        .await
        .unwrap();
    assert_eq!(escalated.len(), 1);

    let stored = h.reload(&cert.id);
    assert_eq!(stored.escalation_level, 2);
    assert_eq!(stored.status, CertificateStatus::Pending);

    // At level 2 the warning rule no longer applies
    let again = run_escalation_sweep(&h.db, &h.dyn_notifier(), &admins, Utc::now())
        .await
        .unwrap();
    assert!(again.is_empty());
    assert_eq!(h.reload(&cert.id).escalation_level, 2);
}

#[tokio::test]
async fn test_warning_not_applied_above_its_level() {
    let h = Harness::new();
    let cert = h.create_backdated("11111-1111111-1", "B01", 31);
    h.set_level(&cert, 2);

    let escalated = run_escalation_sweep(
        &h.db,
        &h.dyn_notifier(),
        &[ADMIN_EMAIL.to_string()],
        Utc::now(),
    )
    .await
    .unwrap();
    assert!(escalated.is_empty());
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn test_escalated_certificate_remains_verifiable() {
    let h = Harness::new();
    let cert = h.create_backdated("11111-1111111-1", "B01", 46);

    run_escalation_sweep(
        &h.db,
        &h.dyn_notifier(),
        &[ADMIN_EMAIL.to_string()],
        Utc::now(),
    )
    .await
    .unwrap();
    assert_eq!(h.reload(&cert.id).status, CertificateStatus::Escalated);

    // The assigned officer can still conclude an escalated certificate
    h.engine
        .assign(&cert.id, &h.officer.id, &h.creator)
        .await
        .unwrap();
    let cert = h.engine.verify(&cert.id, "ref", &h.officer).await.unwrap();
    assert_eq!(cert.status, CertificateStatus::Verified);
    assert!(cert.verified_at.is_some());
}

// =============================================================================
// Scheduler
// =============================================================================

#[tokio::test]
async fn test_tick_sends_final_reminder_before_warning_promotion() {
    let h = Harness::new();
    let cert = h.create_backdated("11111-1111111-1", "B01", 30);
    h.assign_direct(&cert.id, &h.officer.id);
    h.mark_reminded(&cert, 21);

    let scheduler = SweepScheduler::new(
        Arc::clone(&h.db),
        h.dyn_notifier(),
        Duration::from_secs(3600),
        vec![ADMIN_EMAIL.to_string()],
    );
    scheduler.run_once(Utc::now()).await.unwrap();

    // Day 30 crosses both thresholds; the reminder lands first
    let notices = h.notifier.notices();
    assert_eq!(notices.len(), 2);
    assert!(matches!(
        &notices[0],
        Notice::Reminder {
            reminder: ReminderType::Final,
            ..
        }
    ));
    assert!(matches!(&notices[1], Notice::Escalation { level: 2, .. }));

    let stored = h.reload(&cert.id);
    assert_eq!(stored.last_reminder_day, 30);
    assert_eq!(stored.escalation_level, 2);
    assert_eq!(stored.status, CertificateStatus::Pending);
}

#[tokio::test]
async fn test_scheduler_start_and_stop() {
    let h = Harness::new();
    let scheduler = Arc::new(SweepScheduler::new(
        Arc::clone(&h.db),
        h.dyn_notifier(),
        Duration::from_secs(3600),
        vec![ADMIN_EMAIL.to_string()],
    ));

    assert!(!scheduler.is_running().await);
    Arc::clone(&scheduler).start().await.unwrap();
    assert!(scheduler.is_running().await);

    // Starting twice is a warning, not a second loop
    Arc::clone(&scheduler).start().await.unwrap();
    assert!(scheduler.is_running().await);

    scheduler.stop().await;
    assert!(!scheduler.is_running().await);
}
