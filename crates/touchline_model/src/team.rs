//! Teams.

use crate::id::EntityId;
use crate::now_ms;
use serde::{Deserialize, Serialize};

/// A team the coach manages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Stable opaque id.
    pub id: EntityId,
    /// Team name shown throughout the app.
    pub name: String,
    /// Free-form descriptor of the competition format, e.g. "5v5".
    #[serde(default)]
    pub game_type: Option<String>,
    /// Creation time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at_ms: u64,
    /// Last modification time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub updated_at_ms: u64,
}

impl Team {
    /// Creates a new team with a fresh id and current timestamps.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id: EntityId::new(),
            name: name.into(),
            game_type: None,
            created_at_ms: now,
            updated_at_ms: now,
        }
    }

    /// Stamps the entity as modified now.
    pub fn touch(&mut self) {
        self.updated_at_ms = now_ms();
    }
}
