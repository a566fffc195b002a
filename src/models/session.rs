use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::history::History;

/// Per-visitor conversation state.
///
/// Sessions are **ephemeral**: they are created on the first visit, refreshed
/// on every turn and expire after a fixed inactivity window. An explicit reset
/// throws the whole session away.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub history: History,
    /// Ids of manuals already offered to this visitor (card or list).
    #[serde(default)]
    pub shown_manuals: Vec<String>,
    /// Set after a manual card or list reply; enables "another one?" follow-ups.
    #[serde(default)]
    pub manual_context: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            history: History::new(),
            shown_manuals: Vec::new(),
            manual_context: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.updated_at > ttl
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn has_seen(&self, manual_id: &str) -> bool {
        self.shown_manuals.iter().any(|id| id == manual_id)
    }

    pub fn mark_shown(&mut self, manual_id: &str) {
        if !self.has_seen(manual_id) {
            self.shown_manuals.push(manual_id.to_string());
        }
    }
}
