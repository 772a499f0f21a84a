//! Actor roles and identity
//!
//! Actors are an authorization input to the access policy evaluator and an
//! assignment target. They are provisioned outside the lifecycle core; beat
//! codes arrive here already decoded into a set.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::TrackerError;

/// Workflow roles, ascending privilege tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Role {
    /// Field officer performing verification within assigned beats
    BeatOfficer = 0,
    /// Benefit tracking section field operator
    BtsFo = 1,
    /// Benefit tracking section officer, creates and assigns certificates
    Bts = 2,
    /// Deputy regional head
    Drh = 3,
    /// Regional head
    Rh = 4,
    /// Deputy director general, oversight
    Ddg = 5,
    /// Chairman, oversight
    Chairman = 6,
    Admin = 7,
    SuperAdmin = 8,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::BeatOfficer => "beat_officer",
            Role::BtsFo => "bts_fo",
            Role::Bts => "bts",
            Role::Drh => "drh",
            Role::Rh => "rh",
            Role::Ddg => "ddg",
            Role::Chairman => "chairman",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Top tiers and oversight roles bypass region/beat restrictions
    pub fn is_privileged(&self) -> bool {
        matches!(
            self,
            Role::SuperAdmin | Role::Admin | Role::Chairman | Role::Ddg
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beat_officer" => Ok(Role::BeatOfficer),
            "bts_fo" => Ok(Role::BtsFo),
            "bts" => Ok(Role::Bts),
            "drh" => Ok(Role::Drh),
            "rh" => Ok(Role::Rh),
            "ddg" => Ok(Role::Ddg),
            "chairman" => Ok(Role::Chairman),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(TrackerError::Internal(format!("Unknown role '{}'", other))),
        }
    }
}

/// An authenticated workflow participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Bound region, scopes every query/action for non-privileged roles
    pub region_id: Option<String>,
    /// Beats a field officer may work, empty for other roles
    #[serde(default)]
    pub beat_codes: BTreeSet<String>,
}

impl Actor {
    pub fn has_beat(&self, beat_code: &str) -> bool {
        self.beat_codes.contains(beat_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::SuperAdmin > Role::Admin);
        assert!(Role::Admin > Role::Chairman);
        assert!(Role::Rh > Role::Drh);
        assert!(Role::Bts > Role::BtsFo);
        assert!(Role::BtsFo > Role::BeatOfficer);
    }

    #[test]
    fn test_privileged_roles() {
        assert!(Role::SuperAdmin.is_privileged());
        assert!(Role::Admin.is_privileged());
        assert!(Role::Chairman.is_privileged());
        assert!(Role::Ddg.is_privileged());
        assert!(!Role::Rh.is_privileged());
        assert!(!Role::Bts.is_privileged());
        assert!(!Role::BeatOfficer.is_privileged());
    }

    #[test]
    fn test_role_roundtrip() {
        for role in [
            Role::BeatOfficer,
            Role::BtsFo,
            Role::Bts,
            Role::Drh,
            Role::Rh,
            Role::Ddg,
            Role::Chairman,
            Role::Admin,
            Role::SuperAdmin,
        ] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_has_beat() {
        let actor = Actor {
            id: "u1".to_string(),
            name: "Officer".to_string(),
            email: "officer@example.com".to_string(),
            role: Role::BeatOfficer,
            region_id: Some("r1".to_string()),
            beat_codes: ["B01".to_string(), "B02".to_string()].into_iter().collect(),
        };
        assert!(actor.has_beat("B01"));
        assert!(!actor.has_beat("B03"));
    }
}
