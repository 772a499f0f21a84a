//! Seed provisioning
//!
//! Loads regions and users from a TOML file at startup. Region codes in
//! the seed are resolved to region ids and beat-code arrays are decoded
//! into sets here, before anything reaches a certificate operation.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{regions, users, TrackerDb};
use crate::types::{Actor, Region, Result, Role, TrackerError};

/// Seed file contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub regions: Vec<SeedRegion>,
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedRegion {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Region code, resolved to a region id during apply
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub beat_codes: Vec<String>,
}

/// What a seed application changed
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedSummary {
    pub regions_added: usize,
    pub users_added: usize,
}

/// Parse a seed file
pub fn load_seed(path: &Path) -> Result<SeedFile> {
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|e| TrackerError::Config(format!("Invalid seed file: {}", e)))
}

/// Apply a seed, inserting regions and users that are not present yet
///
/// Existing rows (matched by region code / user email) are left alone, so
/// re-running the same seed on every start is harmless.
pub fn apply_seed(db: &TrackerDb, seed: &SeedFile) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for seed_region in &seed.regions {
        let existing = db.with_conn(|conn| regions::get_by_code(conn, &seed_region.code))?;
        if existing.is_some() {
            debug!("Region {} already present", seed_region.code);
            continue;
        }

        let region = Region {
            id: Uuid::new_v4().to_string(),
            code: seed_region.code.clone(),
            name: seed_region.name.clone(),
        };
        db.with_conn(|conn| regions::insert(conn, &region))?;
        summary.regions_added += 1;
    }

    for seed_user in &seed.users {
        let existing = db.with_conn(|conn| users::get_by_email(conn, &seed_user.email))?;
        if existing.is_some() {
            debug!("User {} already present", seed_user.email);
            continue;
        }

        let region_id = match &seed_user.region {
            Some(code) => {
                let region = db
                    .with_conn(|conn| regions::get_by_code(conn, code))?
                    .ok_or_else(|| TrackerError::RegionNotFound(code.clone()))?;
                Some(region.id)
            }
            None => None,
        };

        let actor = Actor {
            id: Uuid::new_v4().to_string(),
            name: seed_user.name.clone(),
            email: seed_user.email.clone(),
            role: seed_user.role,
            region_id,
            beat_codes: seed_user.beat_codes.iter().cloned().collect(),
        };
        db.with_conn(|conn| users::insert(conn, &actor))?;
        summary.users_added += 1;
    }

    info!(
        "Seed applied: {} regions, {} users added",
        summary.regions_added, summary.users_added
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"
[[regions]]
code = "2100"
name = "Karachi"

[[users]]
name = "Section Officer"
email = "bts@example.com"
role = "bts"
region = "2100"

[[users]]
name = "Field Officer"
email = "officer@example.com"
role = "beat_officer"
region = "2100"
beat_codes = ["B01", "B02"]
"#;

    #[test]
    fn test_parse_seed() {
        let seed: SeedFile = toml::from_str(SEED).unwrap();
        assert_eq!(seed.regions.len(), 1);
        assert_eq!(seed.users.len(), 2);
        assert_eq!(seed.users[1].role, Role::BeatOfficer);
        assert_eq!(seed.users[1].beat_codes, vec!["B01", "B02"]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let db = TrackerDb::open_in_memory().unwrap();
        let seed: SeedFile = toml::from_str(SEED).unwrap();

        let first = apply_seed(&db, &seed).unwrap();
        assert_eq!(first.regions_added, 1);
        assert_eq!(first.users_added, 2);

        let second = apply_seed(&db, &seed).unwrap();
        assert_eq!(second.regions_added, 0);
        assert_eq!(second.users_added, 0);

        let officer = db
            .with_conn(|conn| users::get_by_email(conn, "officer@example.com"))
            .unwrap()
            .unwrap();
        assert!(officer.region_id.is_some());
        assert!(officer.has_beat("B01"));
    }

    #[test]
    fn test_unknown_region_code_rejected() {
        let db = TrackerDb::open_in_memory().unwrap();
        let seed: SeedFile = toml::from_str(
            r#"
[[users]]
name = "Orphan"
email = "orphan@example.com"
role = "bts"
region = "9999"
"#,
        )
        .unwrap();

        assert!(matches!(
            apply_seed(&db, &seed),
            Err(TrackerError::RegionNotFound(_))
        ));
    }
}
