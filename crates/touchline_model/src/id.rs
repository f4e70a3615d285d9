//! Entity identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier for an entity.
///
/// Entity ids are:
/// - Globally unique within a store
/// - Immutable once assigned
/// - Preserved verbatim by every write path, including migration
///
/// New ids are UUIDv4 strings, but the type accepts any non-empty
/// string so ids minted by older schema versions survive a migration
/// byte-for-byte. Never regenerate an id when copying an entity
/// between stores.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates a new random entity id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates an entity id from an existing opaque string.
    ///
    /// Used when re-hydrating persisted data or importing legacy ids;
    /// the string is taken as-is.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the id is empty.
    ///
    /// Empty ids never validate; this exists so validation can report
    /// them instead of persisting them.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for EntityId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unique() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn raw_ids_survive_verbatim() {
        let id = EntityId::from_raw("legacy_player_007");
        assert_eq!(id.as_str(), "legacy_player_007");
        assert_eq!(id.to_string(), "legacy_player_007");
    }

    #[test]
    fn serde_is_transparent() {
        let id = EntityId::from_raw("p1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"p1\"");

        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn empty_detection() {
        assert!(EntityId::from_raw("").is_empty());
        assert!(!EntityId::new().is_empty());
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = EntityId::from_raw("a");
        let b = EntityId::from_raw("b");
        assert!(a < b);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Ids minted by any schema version must survive storage
            // byte-for-byte, whatever characters they contain.
            #[test]
            fn raw_ids_round_trip_serde(raw in ".*") {
                let id = EntityId::from_raw(raw.clone());
                let json = serde_json::to_string(&id).unwrap();
                let back: EntityId = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(back.as_str(), raw.as_str());
            }
        }
    }
}
