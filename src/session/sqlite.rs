use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{Duration, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use super::{schema, SessionStore};
use crate::models::Session;

/// Session store backed by a SQLite file.
///
/// Each session is stored as a JSON document next to its last-activity
/// timestamp (unix milliseconds) so expiry can be checked without decoding.
#[derive(Clone)]
pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
    ttl: Duration,
}

impl SqliteSessionStore {
    pub fn open(path: PathBuf, ttl: Duration) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Session database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            ttl,
        })
    }

    /// `sessions.db` in the platform data directory.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "almostme")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("sessions.db"))
    }

    pub fn open_memory(ttl: Duration) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            ttl,
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    fn cutoff_ms(&self) -> i64 {
        (Utc::now() - self.ttl).timestamp_millis()
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self, id: Uuid) -> Result<Option<Session>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT data, updated_at_ms FROM sessions WHERE id = ?",
                [id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((data, updated_at_ms)) = row else {
            return Ok(None);
        };

        if updated_at_ms < self.cutoff_ms() {
            conn.execute("DELETE FROM sessions WHERE id = ?", [id.to_string()])?;
            tracing::debug!("Session {} expired", id);
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&data)?))
    }

    fn save(&self, session: &Session) -> Result<()> {
        let data = serde_json::to_string(session)?;
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO sessions (id, data, created_at, updated_at_ms)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at_ms = excluded.updated_at_ms",
            (
                session.id.to_string(),
                data,
                session.created_at.to_rfc3339(),
                session.updated_at.timestamp_millis(),
            ),
        )?;
        Ok(())
    }

    fn remove(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM sessions WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    fn purge_expired(&self) -> Result<usize> {
        let cutoff = self.cutoff_ms();
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM sessions WHERE updated_at_ms < ?", [cutoff])?;
        Ok(rows)
    }
}
