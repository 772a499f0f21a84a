//! Certificate CRUD and guarded transition updates
//!
//! Every status transition is written as a conditional UPDATE carrying the
//! expected current state. A guard miss means another worker got there
//! first; callers treat it as an invalid transition instead of overwriting.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::tracking;
use crate::types::{
    Certificate, CertificateFilter, CertificateStatus, NewCertificate, Result, TrackerError,
};

use super::regions;

fn from_row(row: &Row) -> std::result::Result<Certificate, rusqlite::Error> {
    let status_str: String = row.get("status")?;
    let status = status_str.parse::<CertificateStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Certificate {
        id: row.get("id")?,
        tracking_id: row.get("tracking_id")?,
        region_id: row.get("region_id")?,
        beat_code: row.get("beat_code")?,
        claimant_name: row.get("claimant_name")?,
        father_name: row.get("father_name")?,
        fir_number: row.get("fir_number")?,
        eobi_number: row.get("eobi_number")?,
        cnic: row.get("cnic")?,
        employer_name: row.get("employer_name")?,
        employer_main_code: row.get("employer_main_code")?,
        employer_sub_code: row.get("employer_sub_code")?,
        status,
        assigned_by: row.get("assigned_by")?,
        assigned_to: row.get("assigned_to")?,
        due_date: row.get("due_date")?,
        verified_at: row.get("verified_at")?,
        evidence_ref: row.get("evidence_ref")?,
        rejection_reason: row.get("rejection_reason")?,
        escalation_level: row.get("escalation_level")?,
        last_reminder_day: row.get("last_reminder_day")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Create a certificate, allocating its tracking id in the same transaction
///
/// The per (region, beat) counter bump, the uniqueness checks and the
/// insert commit together, so no two certificates ever share a sequence
/// number and a failed creation leaves no trace.
pub fn create(
    conn: &mut Connection,
    input: &NewCertificate,
    creator_id: &str,
    grace_days: i64,
    now: DateTime<Utc>,
) -> Result<Certificate> {
    let tx = conn
        .transaction()
        .map_err(|e| TrackerError::Database(format!("Transaction failed: {}", e)))?;

    let region = regions::get(&tx, &input.region_id)?
        .ok_or_else(|| TrackerError::RegionNotFound(input.region_id.clone()))?;

    let cnic_taken: i64 = tx
        .query_row(
            "SELECT COUNT(*) FROM certificates WHERE cnic = ?1",
            params![input.cnic],
            |row| row.get(0),
        )
        .map_err(|e| TrackerError::Database(format!("Query failed: {}", e)))?;
    if cnic_taken > 0 {
        return Err(TrackerError::Validation(format!(
            "CNIC {} is already registered",
            input.cnic
        )));
    }

    tx.execute(
        "INSERT INTO tracking_sequences (region_id, beat_code, last_seq) VALUES (?1, ?2, 1)
         ON CONFLICT(region_id, beat_code) DO UPDATE SET last_seq = last_seq + 1",
        params![input.region_id, input.beat_code],
    )
    .map_err(|e| TrackerError::Database(format!("Sequence allocation failed: {}", e)))?;

    let seq: u32 = tx
        .query_row(
            "SELECT last_seq FROM tracking_sequences WHERE region_id = ?1 AND beat_code = ?2",
            params![input.region_id, input.beat_code],
            |row| row.get(0),
        )
        .map_err(|e| TrackerError::Database(format!("Sequence read failed: {}", e)))?;

    let cert = Certificate {
        id: Uuid::new_v4().to_string(),
        tracking_id: tracking::format_tracking_id(&region.code, &input.beat_code, seq),
        region_id: input.region_id.clone(),
        beat_code: input.beat_code.clone(),
        claimant_name: input.claimant_name.clone(),
        father_name: input.father_name.clone(),
        fir_number: input.fir_number.clone(),
        eobi_number: input.eobi_number.clone(),
        cnic: input.cnic.clone(),
        employer_name: input.employer_name.clone(),
        employer_main_code: input.employer_main_code.clone(),
        employer_sub_code: input.employer_sub_code.clone(),
        status: CertificateStatus::Pending,
        assigned_by: creator_id.to_string(),
        assigned_to: None,
        due_date: now + Duration::days(grace_days),
        verified_at: None,
        evidence_ref: None,
        rejection_reason: None,
        escalation_level: 0,
        last_reminder_day: 0,
        created_at: now,
        updated_at: now,
    };

    tx.execute(
        "INSERT INTO certificates (
            id, tracking_id, region_id, beat_code,
            claimant_name, father_name, fir_number, eobi_number, cnic,
            employer_name, employer_main_code, employer_sub_code,
            status, assigned_by, assigned_to, due_date,
            escalation_level, last_reminder_day, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
        params![
            cert.id,
            cert.tracking_id,
            cert.region_id,
            cert.beat_code,
            cert.claimant_name,
            cert.father_name,
            cert.fir_number,
            cert.eobi_number,
            cert.cnic,
            cert.employer_name,
            cert.employer_main_code,
            cert.employer_sub_code,
            cert.status.as_str(),
            cert.assigned_by,
            cert.assigned_to,
            cert.due_date,
            cert.escalation_level,
            cert.last_reminder_day,
            cert.created_at,
            cert.updated_at,
        ],
    )
    .map_err(|e| TrackerError::Database(format!("Certificate insert failed: {}", e)))?;

    tx.commit()
        .map_err(|e| TrackerError::Database(format!("Commit failed: {}", e)))?;

    Ok(cert)
}

/// Get a certificate by id
pub fn get(conn: &Connection, id: &str) -> Result<Option<Certificate>> {
    let mut stmt = conn
        .prepare("SELECT * FROM certificates WHERE id = ?1")
        .map_err(|e| TrackerError::Database(format!("Prepare failed: {}", e)))?;

    let mut rows = stmt
        .query(params![id])
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

/// Get a certificate by tracking id
pub fn get_by_tracking(conn: &Connection, tracking_id: &str) -> Result<Option<Certificate>> {
    let mut stmt = conn
        .prepare("SELECT * FROM certificates WHERE tracking_id = ?1")
        .map_err(|e| TrackerError::Database(format!("Prepare failed: {}", e)))?;

    let mut rows = stmt
        .query(params![tracking_id])
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

/// List certificates matching a filter, newest first
pub fn list(conn: &Connection, filter: &CertificateFilter) -> Result<Vec<Certificate>> {
    let mut sql = String::from("SELECT * FROM certificates");
    let mut clauses: Vec<String> = vec![];
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![];

    if let Some(status) = filter.status {
        clauses.push(format!("status = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(status.as_str().to_string()));
    }

    if let Some(ref region_id) = filter.region_id {
        clauses.push(format!("region_id = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(region_id.clone()));
    }

    if !filter.beat_codes.is_empty() {
        let placeholders: Vec<String> = filter
            .beat_codes
            .iter()
            .enumerate()
            .map(|(i, _)| format!("?{}", params_vec.len() + 1 + i))
            .collect();
        clauses.push(format!("beat_code IN ({})", placeholders.join(", ")));
        for beat in &filter.beat_codes {
            params_vec.push(Box::new(beat.clone()));
        }
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY created_at DESC");

    query_certificates(conn, &sql, &params_vec)
}

/// Snapshot of candidates for the reminder sweep
pub fn reminder_candidates(conn: &Connection) -> Result<Vec<Certificate>> {
    query_certificates(
        conn,
        "SELECT * FROM certificates WHERE status = 'Pending' AND escalation_level < 3
         ORDER BY created_at ASC",
        &[],
    )
}

/// Snapshot of candidates for the escalation sweep
pub fn escalation_candidates(conn: &Connection) -> Result<Vec<Certificate>> {
    query_certificates(
        conn,
        "SELECT * FROM certificates WHERE status = 'Pending' ORDER BY created_at ASC",
        &[],
    )
}

fn query_certificates(
    conn: &Connection,
    sql: &str,
    params_vec: &[Box<dyn rusqlite::ToSql>],
) -> Result<Vec<Certificate>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| TrackerError::Database(format!("Prepare failed: {}", e)))?;

    let param_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

    let certs = stmt
        .query_map(param_refs.as_slice(), from_row)
        .map_err(|e| TrackerError::Database(format!("Query failed: {}", e)))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| TrackerError::Database(format!("Row parse failed: {}", e)))?;

    Ok(certs)
}

/// Record an assignment; last assignment wins while non-terminal
pub fn record_assignment(
    conn: &Connection,
    id: &str,
    officer_id: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE certificates SET assigned_to = ?1, updated_at = ?2
             WHERE id = ?3 AND status IN ('Pending', 'Escalated')",
            params![officer_id, now, id],
        )
        .map_err(|e| TrackerError::Database(format!("Assignment update failed: {}", e)))?;
    Ok(changed == 1)
}

/// Record a verification transition; guards on status and assigned officer
pub fn record_verification(
    conn: &Connection,
    id: &str,
    evidence_ref: &str,
    officer_id: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE certificates
             SET status = 'Verified', verified_at = ?1, evidence_ref = ?2, updated_at = ?1
             WHERE id = ?3 AND status IN ('Pending', 'Escalated') AND assigned_to = ?4",
            params![now, evidence_ref, id, officer_id],
        )
        .map_err(|e| TrackerError::Database(format!("Verification update failed: {}", e)))?;
    Ok(changed == 1)
}

/// Record a rejection transition; guards on status and assigned officer
pub fn record_rejection(
    conn: &Connection,
    id: &str,
    reason: &str,
    officer_id: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE certificates
             SET status = 'Rejected', rejection_reason = ?1, updated_at = ?2
             WHERE id = ?3 AND status IN ('Pending', 'Escalated') AND assigned_to = ?4",
            params![reason, now, id, officer_id],
        )
        .map_err(|e| TrackerError::Database(format!("Rejection update failed: {}", e)))?;
    Ok(changed == 1)
}

/// Record an escalation; guards on the expected level and status so a
/// certificate escalates at most once per decision
pub fn record_escalation(
    conn: &Connection,
    id: &str,
    new_level: u8,
    new_status: CertificateStatus,
    expected_level: u8,
    expected_status: CertificateStatus,
    now: DateTime<Utc>,
) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE certificates SET escalation_level = ?1, status = ?2, updated_at = ?3
             WHERE id = ?4 AND escalation_level = ?5 AND status = ?6",
            params![
                new_level,
                new_status.as_str(),
                now,
                id,
                expected_level,
                expected_status.as_str()
            ],
        )
        .map_err(|e| TrackerError::Database(format!("Escalation update failed: {}", e)))?;
    Ok(changed == 1)
}

/// Record a sent reminder threshold; guarded so each threshold is
/// persisted at most once even under overlapping sweeps
pub fn record_reminder(conn: &Connection, id: &str, day: u32, now: DateTime<Utc>) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE certificates SET last_reminder_day = ?1, updated_at = ?2
             WHERE id = ?3 AND last_reminder_day < ?1",
            params![day, now, id],
        )
        .map_err(|e| TrackerError::Database(format!("Reminder update failed: {}", e)))?;
    Ok(changed == 1)
}

/// Record a manual reminder, overriding the send-once guard
pub fn record_reminder_override(
    conn: &Connection,
    id: &str,
    day: u32,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "UPDATE certificates SET last_reminder_day = ?1, updated_at = ?2 WHERE id = ?3",
        params![day, now, id],
    )
    .map_err(|e| TrackerError::Database(format!("Reminder update failed: {}", e)))?;
    Ok(())
}
