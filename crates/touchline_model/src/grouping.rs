//! Seasons and tournaments, the two ways games are grouped.

use crate::id::EntityId;
use serde::{Deserialize, Serialize};

/// A season games can be filed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    /// Stable opaque id.
    pub id: EntityId,
    /// Display name, e.g. "Spring 2026".
    pub name: String,
    /// Inclusive start date, ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Inclusive end date, ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub end_date: Option<String>,
}

impl Season {
    /// Creates a new season with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            start_date: None,
            end_date: None,
        }
    }
}

/// A tournament games can be filed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    /// Stable opaque id.
    pub id: EntityId,
    /// Display name, e.g. "Midsummer Cup".
    pub name: String,
    /// Inclusive start date, ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Inclusive end date, ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub end_date: Option<String>,
}

impl Tournament {
    /// Creates a new tournament with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            start_date: None,
            end_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_are_optional() {
        let s: Season = serde_json::from_str(r#"{"id":"s1","name":"Fall"}"#).unwrap();
        assert!(s.start_date.is_none());
        assert!(s.end_date.is_none());
    }

    #[test]
    fn tournament_round_trips() {
        let mut t = Tournament::new("Cup");
        t.start_date = Some("2026-06-01".into());
        let json = serde_json::to_string(&t).unwrap();
        let back: Tournament = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
