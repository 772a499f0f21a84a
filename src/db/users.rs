//! User directory operations
//!
//! Beat codes are stored as a JSON array column and decoded into the
//! actor's set exactly here, never re-parsed further in.

use std::collections::BTreeSet;

use rusqlite::{params, Connection, Row};

use crate::types::{Actor, Result, Role, TrackerError};

fn from_row(row: &Row) -> std::result::Result<Actor, rusqlite::Error> {
    let role_str: String = row.get("role")?;
    let role = role_str.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let beat_json: String = row.get("beat_codes")?;
    let beat_codes: BTreeSet<String> = serde_json::from_str(&beat_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Actor {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        role,
        region_id: row.get("region_id")?,
        beat_codes,
    })
}

/// Insert a user
pub fn insert(conn: &Connection, actor: &Actor) -> Result<()> {
    let beat_json = serde_json::to_string(&actor.beat_codes)?;
    conn.execute(
        "INSERT INTO users (id, name, email, role, region_id, beat_codes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            actor.id,
            actor.name,
            actor.email,
            actor.role.as_str(),
            actor.region_id,
            beat_json
        ],
    )
    .map_err(|e| TrackerError::Database(format!("User insert failed: {}", e)))?;
    Ok(())
}

fn query_one(conn: &Connection, sql: &str, param: &str) -> Result<Option<Actor>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| TrackerError::Database(format!("Prepare failed: {}", e)))?;

    let mut rows = stmt
        .query(params![param])
        .map_err(|e| TrackerError::Database(format!("Query failed: {}", e)))?;

    match rows
        .next()
        .map_err(|e| TrackerError::Database(format!("Row fetch failed: {}", e)))?
    {
        Some(row) => Ok(Some(
            from_row(row).map_err(|e| TrackerError::Database(format!("Row parse failed: {}", e)))?,
        )),
        None => Ok(None),
    }
}

/// Look up a user by id
pub fn get(conn: &Connection, id: &str) -> Result<Option<Actor>> {
    query_one(conn, "SELECT * FROM users WHERE id = ?1 AND is_active = 1", id)
}

/// Look up a user by email
pub fn get_by_email(conn: &Connection, email: &str) -> Result<Option<Actor>> {
    query_one(
        conn,
        "SELECT * FROM users WHERE email = ?1 AND is_active = 1",
        email,
    )
}

/// Find the regional head for a region (escalation recipient)
pub fn find_region_head(conn: &Connection, region_id: &str) -> Result<Option<Actor>> {
    query_one(
        conn,
        "SELECT * FROM users WHERE role = 'rh' AND region_id = ?1 AND is_active = 1",
        region_id,
    )
}
