//! Property-based test generators using proptest.
//!
//! Strategies produce entities that always pass field validation, so
//! properties exercise store behavior rather than validation rejects.

use proptest::prelude::*;
use touchline_model::{EntityId, GameEvent, GameEventKind, Player, Season};

/// Strategy for opaque entity ids.
///
/// Covers both UUID-shaped and short legacy-shaped ids; never empty.
pub fn entity_id_strategy() -> impl Strategy<Value = EntityId> {
    prop::string::string_regex("[a-z0-9][a-z0-9_-]{0,23}")
        .expect("invalid regex")
        .prop_map(EntityId::from_raw)
}

/// Strategy for display names that pass validation (non-blank).
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9 ]{0,23}").expect("invalid regex")
}

/// Strategy for players that always validate.
pub fn player_strategy() -> impl Strategy<Value = Player> {
    (
        entity_id_strategy(),
        name_strategy(),
        prop::option::of(0u32..100),
        any::<bool>(),
    )
        .prop_map(|(id, name, jersey, is_goalie)| {
            let mut player = Player::new(name);
            player.id = id;
            player.jersey_number = jersey.map(|n| n.to_string());
            player.is_goalie = is_goalie;
            player
        })
}

/// Strategy for seasons with correctly ordered dates.
pub fn season_strategy() -> impl Strategy<Value = Season> {
    (entity_id_strategy(), name_strategy(), prop::option::of(1u32..=12))
        .prop_map(|(id, name, span)| {
            let mut season = Season::new(name);
            season.id = id;
            if let Some(months) = span {
                season.start_date = Some("2026-01-01".to_owned());
                season.end_date = Some(format!("2026-{months:02}-28"));
            }
            season
        })
}

/// Strategy for game events anywhere inside a two-hour game.
pub fn game_event_strategy() -> impl Strategy<Value = GameEvent> {
    let kind = prop_oneof![
        Just(GameEventKind::Goal),
        Just(GameEventKind::OpponentGoal),
        Just(GameEventKind::Substitution),
        Just(GameEventKind::PeriodEnd),
        Just(GameEventKind::GameEnd),
        Just(GameEventKind::FairPlayCard),
    ];
    (kind, 0u64..7200).prop_map(|(kind, time)| GameEvent::new(kind, time))
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use touchline_model::Validate;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_ids_are_never_empty(id in entity_id_strategy()) {
            prop_assert!(!id.is_empty());
        }

        #[test]
        fn generated_players_validate(player in player_strategy()) {
            prop_assert!(player.validate().is_ok());
        }

        #[test]
        fn generated_seasons_validate(season in season_strategy()) {
            prop_assert!(season.validate().is_ok());
        }

        #[test]
        fn generated_events_stay_on_the_clock(event in game_event_strategy()) {
            prop_assert!(event.time_seconds < 7200);
        }
    }
}
