//! SQLite store for certificates, regions and users
//!
//! The store is the serialization point for the lifecycle engine: all
//! read-check-write sequences run under the connection lock inside a
//! transaction, and every status transition is a guarded UPDATE. Sweep
//! tasks take a snapshot of candidate rows and then perform one guarded
//! read-modify-write per certificate, never holding the lock across a
//! whole sweep iteration's notification calls.
//!
//! ## Tables
//!
//! - `certificates` - the central entity, never deleted
//! - `regions` - read-only reference data, code embedded in tracking ids
//! - `users` - workflow participants, beat codes stored as JSON array
//! - `tracking_sequences` - per (region, beat) counter for tracking ids

pub mod certificates;
pub mod regions;
pub mod schema;
pub mod users;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::types::{Result, TrackerError};

/// SQLite database for the tracking service
pub struct TrackerDb {
    conn: Mutex<Connection>,
}

impl TrackerDb {
    /// Open or create the database at the given path
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("Opening SQLite database at {:?}", db_path);

        let conn = Connection::open(db_path)
            .map_err(|e| TrackerError::Database(format!("Failed to open SQLite: {}", e)))?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| TrackerError::Database(format!("Failed to set PRAGMA: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory SQLite database");

        let conn = Connection::open_in_memory()
            .map_err(|e| TrackerError::Database(format!("Failed to open in-memory SQLite: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.init_schema()?;

        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.with_conn(|conn| schema::init_schema(conn))
    }

    /// Run a read operation against the connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| TrackerError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Run a write operation with exclusive access (for transactions)
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| TrackerError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&mut conn)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        self.with_conn(|conn| {
            let certificate_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM certificates", [], |row| row.get(0))
                .map_err(|e| TrackerError::Database(format!("Query failed: {}", e)))?;

            let pending_count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM certificates WHERE status = 'Pending'",
                    [],
                    |row| row.get(0),
                )
                .map_err(|e| TrackerError::Database(format!("Query failed: {}", e)))?;

            let region_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM regions", [], |row| row.get(0))
                .map_err(|e| TrackerError::Database(format!("Query failed: {}", e)))?;

            let user_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .map_err(|e| TrackerError::Database(format!("Query failed: {}", e)))?;

            Ok(DbStats {
                certificate_count: certificate_count as u64,
                pending_count: pending_count as u64,
                region_count: region_count as u64,
                user_count: user_count as u64,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub certificate_count: u64,
    pub pending_count: u64,
    pub region_count: u64,
    pub user_count: u64,
}
