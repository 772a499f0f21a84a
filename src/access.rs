//! Access policy evaluation
//!
//! Pure functions of (actor role, actor region, actor beat set, target).
//! Privileged roles bypass region and beat restrictions entirely; every
//! other role is confined to its bound region, and beat officers are
//! further confined to their beat-code set.
//!
//! Region handling on list queries is rescoping, not rejection: a
//! region-bound actor's filter is silently narrowed to their region.
//! Beat-set violations always deny.

use crate::types::{Actor, Certificate, CertificateFilter, Result, Role, TrackerError};

/// Mutating and reading operations gated per role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Assign,
    Verify,
    Reject,
    Remind,
    Escalate,
    View,
}

/// Check whether a role may attempt an operation at all
pub fn check_operation(role: Role, operation: Operation) -> Result<()> {
    let allowed = match operation {
        // Tracking section staff and administrators open and route cases
        Operation::Create | Operation::Assign => matches!(
            role,
            Role::Bts | Role::BtsFo | Role::Admin | Role::SuperAdmin
        ),
        // Only field officers conclude verification
        Operation::Verify | Operation::Reject => role == Role::BeatOfficer,
        // Tracking section and regional leadership may nudge manually
        Operation::Remind => matches!(
            role,
            Role::Bts | Role::BtsFo | Role::Drh | Role::Rh | Role::Admin | Role::SuperAdmin
        ),
        // Manual escalation is reserved for regional leadership and up
        Operation::Escalate => role >= Role::Rh,
        Operation::View => true,
    };

    if allowed {
        Ok(())
    } else {
        Err(TrackerError::Forbidden(format!(
            "Role {} may not perform {:?}",
            role, operation
        )))
    }
}

/// Check whether an actor may touch a specific certificate
pub fn check_access(actor: &Actor, certificate: &Certificate) -> Result<()> {
    if actor.role.is_privileged() {
        return Ok(());
    }

    if let Some(ref region_id) = actor.region_id {
        if *region_id != certificate.region_id {
            return Err(TrackerError::Forbidden(
                "Access restricted to your assigned region only".to_string(),
            ));
        }
    }

    if actor.role == Role::BeatOfficer && !actor.has_beat(&certificate.beat_code) {
        return Err(TrackerError::Forbidden(
            "Access restricted to assigned beat codes only".to_string(),
        ));
    }

    Ok(())
}

/// Scope a list filter to what the actor may see
///
/// Region-bound actors are narrowed to their region. Beat officers asking
/// for beats outside their set are denied; with no beat filter they are
/// scoped to their own set.
pub fn scope_filter(actor: &Actor, filter: &CertificateFilter) -> Result<CertificateFilter> {
    let mut scoped = filter.clone();

    if actor.role.is_privileged() {
        return Ok(scoped);
    }

    if let Some(ref region_id) = actor.region_id {
        scoped.region_id = Some(region_id.clone());
    }

    if actor.role == Role::BeatOfficer {
        if scoped.beat_codes.is_empty() {
            scoped.beat_codes = actor.beat_codes.iter().cloned().collect();
        } else if scoped.beat_codes.iter().any(|b| !actor.has_beat(b)) {
            return Err(TrackerError::Forbidden(
                "Access restricted to assigned beat codes only".to_string(),
            ));
        }
    }

    Ok(scoped)
}
