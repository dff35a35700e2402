//! SQLite storage backend for capture sessions

use super::traits::{CaptureStore, OpenStore, StorageError, StorageResult};
use crate::session::{Capture, CaptureSummary, Session};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// The session table only ever holds this row
const SESSION_ROW: i64 = 1;

/// SQLite-backed capture store
///
/// One table holds the session document as JSON, another one row per
/// captured kit. Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Single-row session document
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL,
                saved_at TEXT NOT NULL,
                session_json TEXT NOT NULL
            );

            -- One capture per kit
            CREATE TABLE IF NOT EXISTS captures (
                kit TEXT PRIMARY KEY,
                source_url TEXT,
                captured_at TEXT NOT NULL,
                pedigree_json TEXT NOT NULL,
                gedcom TEXT NOT NULL,
                stats_json TEXT NOT NULL,
                people_count INTEGER NOT NULL,
                family_count INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_captures_captured_at ON captures(captured_at);

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn connection(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(value)
            .map_err(|e| StorageError::DateParse(e.to_string()))?
            .with_timezone(&Utc))
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %path.as_ref().display(), "opening capture store");
        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

impl CaptureStore for SqliteStore {
    // === Session ===

    fn save_session(&self, session: &Session) -> StorageResult<()> {
        let conn = self.connection()?;
        let session_json = serde_json::to_string(session)?;

        conn.execute(
            r#"
            INSERT INTO sessions (id, version, saved_at, session_json)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                version = excluded.version,
                saved_at = excluded.saved_at,
                session_json = excluded.session_json
            "#,
            params![SESSION_ROW, session.version, Utc::now().to_rfc3339(), session_json],
        )?;

        debug!(profiles = session.profiles.len(), "session saved");
        Ok(())
    }

    fn load_session(&self) -> StorageResult<Option<Session>> {
        let conn = self.connection()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT session_json FROM sessions WHERE id = ?1",
                params![SESSION_ROW],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn clear_session(&self) -> StorageResult<bool> {
        let conn = self.connection()?;
        let rows = conn.execute("DELETE FROM sessions WHERE id = ?1", params![SESSION_ROW])?;
        Ok(rows > 0)
    }

    // === Captures ===

    fn save_capture(&self, capture: &Capture) -> StorageResult<()> {
        let conn = self.connection()?;
        let pedigree_json = serde_json::to_string(&capture.pedigree)?;
        let stats_json = serde_json::to_string(&capture.stats)?;

        conn.execute(
            r#"
            INSERT INTO captures (kit, source_url, captured_at, pedigree_json, gedcom,
                                  stats_json, people_count, family_count)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(kit) DO UPDATE SET
                source_url = excluded.source_url,
                captured_at = excluded.captured_at,
                pedigree_json = excluded.pedigree_json,
                gedcom = excluded.gedcom,
                stats_json = excluded.stats_json,
                people_count = excluded.people_count,
                family_count = excluded.family_count
            "#,
            params![
                capture.kit,
                capture.source_url,
                capture.captured_at.to_rfc3339(),
                pedigree_json,
                capture.gedcom,
                stats_json,
                capture.pedigree.people.len() as i64,
                capture.pedigree.families.len() as i64,
            ],
        )?;

        debug!(kit = %capture.kit, people = capture.pedigree.people.len(), "capture saved");
        Ok(())
    }

    fn load_capture(&self, kit: &str) -> StorageResult<Option<Capture>> {
        let conn = self.connection()?;
        let row = conn
            .query_row(
                r#"
                SELECT kit, source_url, captured_at, pedigree_json, gedcom, stats_json
                FROM captures WHERE kit = ?1
                "#,
                params![kit],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((kit, source_url, captured_at, pedigree_json, gedcom, stats_json)) = row else {
            return Ok(None);
        };

        Ok(Some(Capture {
            kit,
            source_url,
            captured_at: Self::parse_timestamp(&captured_at)?,
            pedigree: serde_json::from_str(&pedigree_json)?,
            gedcom,
            stats: serde_json::from_str(&stats_json)?,
        }))
    }

    fn delete_capture(&self, kit: &str) -> StorageResult<bool> {
        let conn = self.connection()?;
        let rows = conn.execute("DELETE FROM captures WHERE kit = ?1", params![kit])?;
        Ok(rows > 0)
    }

    fn list_captures(&self) -> StorageResult<Vec<CaptureSummary>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT kit, captured_at, people_count, family_count FROM captures ORDER BY kit",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(kit, captured_at, people, families)| {
                Ok(CaptureSummary {
                    kit,
                    captured_at: Self::parse_timestamp(&captured_at)?,
                    people: people.max(0) as usize,
                    families: families.max(0) as usize,
                })
            })
            .collect()
    }
}
