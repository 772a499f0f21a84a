//! Database schema definitions

use rusqlite::Connection;
use tracing::info;

use crate::types::{Result, TrackerError};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        create_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        info!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &Connection) -> Result<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )
    .map_err(|e| TrackerError::Database(format!("Failed to create schema_version table: {}", e)))?;

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set schema version
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| TrackerError::Database(format!("Failed to clear schema_version: {}", e)))?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?)", [version])
        .map_err(|e| TrackerError::Database(format!("Failed to set schema_version: {}", e)))?;
    Ok(())
}

/// Create all tables
fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(REFERENCE_SCHEMA)
        .map_err(|e| TrackerError::Database(format!("Failed to create reference tables: {}", e)))?;

    conn.execute_batch(CERTIFICATE_SCHEMA)
        .map_err(|e| TrackerError::Database(format!("Failed to create certificate tables: {}", e)))?;

    conn.execute_batch(INDEXES_SCHEMA)
        .map_err(|e| TrackerError::Database(format!("Failed to create indexes: {}", e)))?;

    Ok(())
}

/// Migrate schema from older version
fn migrate_schema(conn: &Connection, from_version: i32) -> Result<()> {
    // Add migration steps here as schema evolves
    match from_version {
        _ => {}
    }

    set_schema_version(conn, SCHEMA_VERSION)
}

/// Regions and users
const REFERENCE_SCHEMA: &str = r#"
-- Regions: read-only reference data, code is embedded in tracking ids
CREATE TABLE IF NOT EXISTS regions (
    id TEXT PRIMARY KEY NOT NULL,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL
);

-- Workflow participants
-- beat_codes is a JSON array, decoded into a set exactly once on load
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL,
    region_id TEXT,
    beat_codes TEXT NOT NULL DEFAULT '[]',
    is_active INTEGER NOT NULL DEFAULT 1,

    FOREIGN KEY (region_id) REFERENCES regions(id)
);
"#;

/// Certificates and tracking sequences
const CERTIFICATE_SCHEMA: &str = r#"
-- Certificates are never deleted; a status transition is the only form
-- of removal from active queues
CREATE TABLE IF NOT EXISTS certificates (
    id TEXT PRIMARY KEY NOT NULL,
    tracking_id TEXT NOT NULL UNIQUE,
    region_id TEXT NOT NULL,
    beat_code TEXT NOT NULL,

    -- Subject data, opaque to the lifecycle engine
    claimant_name TEXT NOT NULL,
    father_name TEXT,
    fir_number TEXT,
    eobi_number TEXT,
    cnic TEXT NOT NULL UNIQUE,
    employer_name TEXT,
    employer_main_code TEXT,
    employer_sub_code TEXT,

    -- Workflow fields
    status TEXT NOT NULL DEFAULT 'Pending',
    assigned_by TEXT NOT NULL,
    assigned_to TEXT,
    due_date TEXT NOT NULL,
    verified_at TEXT,
    evidence_ref TEXT,
    rejection_reason TEXT,
    escalation_level INTEGER NOT NULL DEFAULT 0,
    last_reminder_day INTEGER NOT NULL DEFAULT 0,

    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    FOREIGN KEY (region_id) REFERENCES regions(id)
);

-- Per (region, beat) counter backing tracking id allocation.
-- Bumped in the same transaction as the certificate insert, so a
-- sequence number is handed out at most once.
CREATE TABLE IF NOT EXISTS tracking_sequences (
    region_id TEXT NOT NULL,
    beat_code TEXT NOT NULL,
    last_seq INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (region_id, beat_code)
);
"#;

/// Index definitions for sweep and listing queries
const INDEXES_SCHEMA: &str = r#"
CREATE INDEX IF NOT EXISTS idx_certificates_status ON certificates(status);
CREATE INDEX IF NOT EXISTS idx_certificates_region ON certificates(region_id);
CREATE INDEX IF NOT EXISTS idx_certificates_beat ON certificates(beat_code);
CREATE INDEX IF NOT EXISTS idx_certificates_assigned_to ON certificates(assigned_to);
CREATE INDEX IF NOT EXISTS idx_certificates_created_at ON certificates(created_at);

CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
CREATE INDEX IF NOT EXISTS idx_users_region ON users(region_id);
"#;
