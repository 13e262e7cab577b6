//! Session recording — persists per-batch outcomes for later review.
//!
//! The pipeline itself keeps nothing across batches; this collaborator gives
//! clerks a history of what was digitized, what failed, and when. Callers own
//! the connection (and therefore the database location); the recorder owns
//! the schema.

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::pipeline::types::{BatchOutcome, NormalizedRecord, TaskFailure};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Summary row for one recorded batch.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub started_at: String,
    pub total: u32,
    pub succeeded: u32,
    pub failed: u32,
}

/// Persistence collaborator for batch outcomes. Receives the immutable
/// outcome after the coordinator returns; never consulted mid-batch.
pub trait SessionRecorder: Send + Sync {
    /// Persist one batch outcome; returns the new session id.
    fn record_batch(&self, conn: &Connection, outcome: &BatchOutcome)
        -> Result<String, SessionError>;
}

/// SQLite-backed session recorder.
pub struct SqliteSessionRecorder;

impl SqliteSessionRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Create the session tables if they don't exist yet.
    pub fn init_schema(conn: &Connection) -> Result<(), SessionError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS batch_sessions (
                 id         TEXT PRIMARY KEY,
                 started_at TEXT NOT NULL,
                 total      INTEGER NOT NULL,
                 succeeded  INTEGER NOT NULL,
                 failed     INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS session_records (
                 id         INTEGER PRIMARY KEY AUTOINCREMENT,
                 session_id TEXT NOT NULL REFERENCES batch_sessions(id),
                 filename   TEXT NOT NULL,
                 category   TEXT NOT NULL,
                 method     TEXT NOT NULL,
                 spec       TEXT NOT NULL,
                 length     REAL,
                 count      INTEGER
             );
             CREATE TABLE IF NOT EXISTS session_failures (
                 id         INTEGER PRIMARY KEY AUTOINCREMENT,
                 session_id TEXT NOT NULL REFERENCES batch_sessions(id),
                 filename   TEXT NOT NULL,
                 error      TEXT NOT NULL
             );",
        )?;
        Ok(())
    }

    /// Most recent sessions, newest first.
    pub fn recent_sessions(
        conn: &Connection,
        limit: u32,
    ) -> Result<Vec<SessionSummary>, SessionError> {
        let mut stmt = conn.prepare(
            "SELECT id, started_at, total, succeeded, failed
             FROM batch_sessions
             ORDER BY started_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(SessionSummary {
                id: row.get(0)?,
                started_at: row.get(1)?,
                total: row.get(2)?,
                succeeded: row.get(3)?,
                failed: row.get(4)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    /// All records captured in one session, in insertion order.
    pub fn session_records(
        conn: &Connection,
        session_id: &str,
    ) -> Result<Vec<NormalizedRecord>, SessionError> {
        let mut stmt = conn.prepare(
            "SELECT filename, category, method, spec, length, count
             FROM session_records
             WHERE session_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok(NormalizedRecord {
                filename: row.get(0)?,
                category: row.get(1)?,
                method: row.get(2)?,
                spec: row.get(3)?,
                length: row.get(4)?,
                count: row.get(5)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    /// Failures captured in one session.
    pub fn session_failures(
        conn: &Connection,
        session_id: &str,
    ) -> Result<Vec<TaskFailure>, SessionError> {
        let mut stmt = conn.prepare(
            "SELECT filename, error
             FROM session_failures
             WHERE session_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok(TaskFailure {
                filename: row.get(0)?,
                error: row.get(1)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }
}

impl Default for SqliteSessionRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRecorder for SqliteSessionRecorder {
    fn record_batch(
        &self,
        conn: &Connection,
        outcome: &BatchOutcome,
    ) -> Result<String, SessionError> {
        let session_id = Uuid::new_v4().to_string();
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO batch_sessions (id, started_at, total, succeeded, failed)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session_id,
                Utc::now().to_rfc3339(),
                outcome.total as u32,
                outcome.succeeded as u32,
                outcome.failed as u32,
            ],
        )?;

        for record in &outcome.records {
            tx.execute(
                "INSERT INTO session_records
                 (session_id, filename, category, method, spec, length, count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session_id,
                    record.filename,
                    record.category,
                    record.method,
                    record.spec,
                    record.length,
                    record.count,
                ],
            )?;
        }

        for failure in &outcome.failures {
            tx.execute(
                "INSERT INTO session_failures (session_id, filename, error)
                 VALUES (?1, ?2, ?3)",
                params![session_id, failure.filename, failure.error],
            )?;
        }

        tx.commit()?;
        tracing::debug!(
            session_id = %session_id,
            records = outcome.records.len(),
            failures = outcome.failures.len(),
            "batch outcome recorded"
        );
        Ok(session_id)
    }
}
