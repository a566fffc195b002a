//! Keyed session storage.
//!
//! The web layer only ever sees a session id (carried in a cookie); the
//! conversation state itself lives behind [`SessionStore`]. Two backends:
//!
//! - [`MemorySessionStore`]: process-local map, lost on restart (default).
//! - [`SqliteSessionStore`]: rusqlite file, survives restarts.
//!
//! Both treat a session idle for longer than the configured TTL as gone.

mod memory;
mod schema;
mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use anyhow::Result;
use chrono::Duration;
use uuid::Uuid;

use crate::models::Session;

/// Default inactivity window before a session expires.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;

pub fn default_ttl() -> Duration {
    Duration::minutes(DEFAULT_SESSION_TTL_MINUTES)
}

/// Persistence for per-visitor [`Session`]s.
///
/// There is no per-session locking: a session is assumed to have at most one
/// request in flight, which holds for a single browser tab.
pub trait SessionStore: Send + Sync {
    /// Fetch a live session. Expired sessions are deleted and reported as `None`.
    fn load(&self, id: Uuid) -> Result<Option<Session>>;

    /// Insert or replace a session.
    fn save(&self, session: &Session) -> Result<()>;

    /// Delete a session. Returns whether it existed.
    fn remove(&self, id: Uuid) -> Result<bool>;

    /// Delete every expired session, returning how many were dropped.
    fn purge_expired(&self) -> Result<usize>;
}
