//! Region directory operations

use rusqlite::{params, Connection, Row};

use crate::types::{Region, Result, TrackerError};

fn from_row(row: &Row) -> std::result::Result<Region, rusqlite::Error> {
    Ok(Region {
        id: row.get("id")?,
        code: row.get("code")?,
        name: row.get("name")?,
    })
}

/// Insert a region
pub fn insert(conn: &Connection, region: &Region) -> Result<()> {
    conn.execute(
        "INSERT INTO regions (id, code, name) VALUES (?1, ?2, ?3)",
        params![region.id, region.code, region.name],
    )
    .map_err(|e| TrackerError::Database(format!("Region insert failed: {}", e)))?;
    Ok(())
}

/// Look up a region by id
pub fn get(conn: &Connection, id: &str) -> Result<Option<Region>> {
    let mut stmt = conn
        .prepare("SELECT id, code, name FROM regions WHERE id = ?1")
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

/// Look up a region by its external code
pub fn get_by_code(conn: &Connection, code: &str) -> Result<Option<Region>> {
    let mut stmt = conn
        .prepare("SELECT id, code, name FROM regions WHERE code = ?1")
        .map_err(|e| TrackerError::Database(format!("Prepare failed: {}", e)))?;

    let mut rows = stmt
        .query(params![code])
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TrackerDb;

    #[test]
    fn test_insert_and_lookup() {
        let db = TrackerDb::open_in_memory().unwrap();
        let region = Region {
            id: "r1".to_string(),
            code: "2100".to_string(),
            name: "Karachi".to_string(),
        };

        db.with_conn(|conn| insert(conn, &region)).unwrap();

        let by_id = db.with_conn(|conn| get(conn, "r1")).unwrap().unwrap();
        assert_eq!(by_id.code, "2100");

        let by_code = db.with_conn(|conn| get_by_code(conn, "2100")).unwrap().unwrap();
        assert_eq!(by_code.id, "r1");

        assert!(db.with_conn(|conn| get(conn, "missing")).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let db = TrackerDb::open_in_memory().unwrap();
        let region = Region {
            id: "r1".to_string(),
            code: "2100".to_string(),
            name: "Karachi".to_string(),
        };
        let dup = Region {
            id: "r2".to_string(),
            code: "2100".to_string(),
            name: "Duplicate".to_string(),
        };

        db.with_conn(|conn| insert(conn, &region)).unwrap();
        assert!(db.with_conn(|conn| insert(conn, &dup)).is_err());
    }
}
