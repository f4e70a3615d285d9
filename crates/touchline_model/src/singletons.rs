//! Singleton documents: app settings, warmup plan, timer state.
//!
//! Each of these exists at most once per store and is addressed by its
//! kind rather than by id.

use crate::id::EntityId;
use serde::{Deserialize, Serialize};

/// App-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// The game currently open in the tracker, if any.
    #[serde(default)]
    pub current_game_id: Option<EntityId>,
    /// UI language tag, e.g. "en" or "fi".
    #[serde(default = "default_language")]
    pub language: String,
    /// Default name prefilled for our side when creating a game.
    #[serde(default)]
    pub default_team_name: Option<String>,
    /// Whether the onboarding flow has been completed.
    #[serde(default)]
    pub has_seen_onboarding: bool,
}

fn default_language() -> String {
    "en".to_owned()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            current_game_id: None,
            language: default_language(),
            default_team_name: None,
            has_seen_onboarding: false,
        }
    }
}

/// One step of the warmup routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmupStep {
    /// What to do.
    pub label: String,
    /// How long to do it for.
    pub duration_seconds: u32,
}

/// The coach's saved warmup routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WarmupPlan {
    /// Ordered steps of the routine.
    #[serde(default)]
    pub steps: Vec<WarmupStep>,
}

impl WarmupPlan {
    /// Total planned duration across all steps.
    #[must_use]
    pub fn total_seconds(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.duration_seconds)).sum()
    }
}

/// Persisted game-clock state, so a restart resumes the running timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TimerState {
    /// The game the clock belongs to, if one is running.
    #[serde(default)]
    pub game_id: Option<EntityId>,
    /// Seconds elapsed on the clock.
    #[serde(default)]
    pub elapsed_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_is_empty() {
        let s = AppSettings::default();
        assert!(s.current_game_id.is_none());
        assert_eq!(s.language, "en");
        assert!(!s.has_seen_onboarding);
    }

    #[test]
    fn settings_language_defaults_when_absent() {
        let s: AppSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(s.language, "en");
    }

    #[test]
    fn warmup_total_sums_steps() {
        let plan = WarmupPlan {
            steps: vec![
                WarmupStep { label: "jog".into(), duration_seconds: 120 },
                WarmupStep { label: "stretch".into(), duration_seconds: 180 },
            ],
        };
        assert_eq!(plan.total_seconds(), 300);
    }

    #[test]
    fn timer_state_round_trips() {
        let t = TimerState {
            game_id: Some(EntityId::from_raw("g1")),
            elapsed_seconds: 754,
        };
        let json = serde_json::to_string(&t).unwrap();
        let back: TimerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
