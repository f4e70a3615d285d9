//! Team personnel (coaches, managers, trainers).

use crate::id::EntityId;
use crate::now_ms;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a personnel member fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonnelRole {
    /// Leads the team.
    HeadCoach,
    /// Assists the head coach.
    AssistantCoach,
    /// Handles logistics.
    Manager,
    /// Runs fitness and warmups.
    Trainer,
}

impl fmt::Display for PersonnelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::HeadCoach => "head coach",
            Self::AssistantCoach => "assistant coach",
            Self::Manager => "manager",
            Self::Trainer => "trainer",
        };
        f.write_str(label)
    }
}

/// A non-player member of the club staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personnel {
    /// Stable opaque id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Staff role.
    pub role: PersonnelRole,
    /// Creation time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at_ms: u64,
    /// Last modification time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub updated_at_ms: u64,
}

impl Personnel {
    /// Creates a new staff member with a fresh id and current timestamps.
    #[must_use]
    pub fn new(name: impl Into<String>, role: PersonnelRole) -> Self {
        let now = now_ms();
        Self {
            id: EntityId::new(),
            name: name.into(),
            role,
            created_at_ms: now,
            updated_at_ms: now,
        }
    }

    /// Stamps the entity as modified now.
    pub fn touch(&mut self) {
        self.updated_at_ms = now_ms();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_snake_case() {
        let json = serde_json::to_string(&PersonnelRole::HeadCoach).unwrap();
        assert_eq!(json, r#""head_coach""#);
    }

    #[test]
    fn role_display_is_human() {
        assert_eq!(PersonnelRole::AssistantCoach.to_string(), "assistant coach");
    }

    #[test]
    fn personnel_round_trips() {
        let p = Personnel::new("Sam", PersonnelRole::Trainer);
        let json = serde_json::to_string(&p).unwrap();
        let back: Personnel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
