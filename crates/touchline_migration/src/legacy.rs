//! Import of pre-cloud single-file archives.
//!
//! Schema version 1 predates the current store: camelCase field names,
//! integer jersey numbers, an `isGoalkeeper` flag, and event times in
//! milliseconds. The importer converts and writes one collection at a
//! time, preserving every id so links inside the archive stay intact.

use crate::progress::{emit, LegacyStage, ProgressObserver};
use crate::result::{MigrationKind, MigrationReport};
use serde::Deserialize;
use std::collections::BTreeMap;
use touchline_model::{
    AppSettings, EntityId, EntityKind, Game, GameEvent, GameEventKind, Player, Season, Team,
    TeamPlayer, Tournament,
};
use touchline_store::{DataStore, StoreError};
use tracing::{info, warn};

/// The one archive format this importer understands.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

/// A complete version-1 archive document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyArchive {
    /// Format version; anything but 1 is rejected.
    pub schema_version: u32,
    /// The master player list, called "roster" in version 1.
    #[serde(default)]
    pub roster: Vec<LegacyPlayer>,
    /// Teams.
    #[serde(default)]
    pub teams: Vec<LegacyTeam>,
    /// Per-team roster entries, keyed by team id.
    #[serde(default)]
    pub team_rosters: BTreeMap<EntityId, Vec<LegacyRosterEntry>>,
    /// Seasons.
    #[serde(default)]
    pub seasons: Vec<LegacyGrouping>,
    /// Tournaments.
    #[serde(default)]
    pub tournaments: Vec<LegacyGrouping>,
    /// Games, keyed by id.
    #[serde(default)]
    pub games: BTreeMap<EntityId, LegacyGame>,
    /// App settings, if the archive carried any.
    #[serde(default)]
    pub settings: Option<LegacySettings>,
}

/// A version-1 player.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPlayer {
    /// Player id, preserved verbatim.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Jersey number; version 1 stored plain integers.
    #[serde(default)]
    pub jersey_number: Option<u32>,
    /// Version 1's name for the goalie flag.
    #[serde(default)]
    pub is_goalkeeper: bool,
    /// Coaching notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<LegacyPlayer> for Player {
    fn from(legacy: LegacyPlayer) -> Self {
        Self {
            id: legacy.id,
            name: legacy.name,
            jersey_number: legacy.jersey_number.map(|n| n.to_string()),
            is_goalie: legacy.is_goalkeeper,
            notes: legacy.notes,
        }
    }
}

/// A version-1 team.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTeam {
    /// Team id, preserved verbatim.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Competition format, e.g. "7v7".
    #[serde(default)]
    pub game_type: Option<String>,
}

impl From<LegacyTeam> for Team {
    fn from(legacy: LegacyTeam) -> Self {
        // Version 1 never stamped timestamps; zero marks "unknown".
        Self {
            id: legacy.id,
            name: legacy.name,
            game_type: legacy.game_type,
            created_at_ms: 0,
            updated_at_ms: 0,
        }
    }
}

/// A version-1 roster entry; the owning team is the map key.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRosterEntry {
    /// Entry id, preserved verbatim.
    pub id: EntityId,
    /// The rostered player.
    pub player_id: EntityId,
    /// Jersey number on this team.
    #[serde(default)]
    pub jersey_number: Option<u32>,
    /// Version 1's name for the goalie flag.
    #[serde(default)]
    pub is_goalkeeper: bool,
}

impl LegacyRosterEntry {
    fn into_entry(self, team_id: EntityId) -> TeamPlayer {
        TeamPlayer {
            id: self.id,
            team_id,
            player_id: self.player_id,
            jersey_number: self.jersey_number.map(|n| n.to_string()),
            is_goalie: self.is_goalkeeper,
        }
    }
}

/// A version-1 season or tournament; both shared one shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyGrouping {
    /// Id, preserved verbatim.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Inclusive start date, ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Inclusive end date, ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub end_date: Option<String>,
}

impl From<LegacyGrouping> for Season {
    fn from(legacy: LegacyGrouping) -> Self {
        Self {
            id: legacy.id,
            name: legacy.name,
            start_date: legacy.start_date,
            end_date: legacy.end_date,
        }
    }
}

impl From<LegacyGrouping> for Tournament {
    fn from(legacy: LegacyGrouping) -> Self {
        Self {
            id: legacy.id,
            name: legacy.name,
            start_date: legacy.start_date,
            end_date: legacy.end_date,
        }
    }
}

/// A version-1 game.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyGame {
    /// Our side's name.
    pub team_name: String,
    /// Opponent's name.
    pub opponent_name: String,
    /// Goals for our side.
    #[serde(default)]
    pub home_score: u32,
    /// Goals for the opponent.
    #[serde(default)]
    pub away_score: u32,
    /// Game date, ISO `YYYY-MM-DD`.
    #[serde(default)]
    pub game_date: Option<String>,
    /// Number of periods.
    #[serde(default = "default_period_count")]
    pub period_count: u8,
    /// Length of one period in minutes.
    #[serde(default = "default_period_duration")]
    pub period_duration_min: u32,
    /// Owning team, if filed under one.
    #[serde(default)]
    pub team_id: Option<EntityId>,
    /// Season link, if any.
    #[serde(default)]
    pub season_id: Option<EntityId>,
    /// Tournament link, if any.
    #[serde(default)]
    pub tournament_id: Option<EntityId>,
    /// Chronological event log.
    #[serde(default)]
    pub events: Vec<LegacyEvent>,
    /// Whether the game was played to completion.
    #[serde(default)]
    pub is_played: bool,
}

fn default_period_count() -> u8 {
    2
}

fn default_period_duration() -> u32 {
    25
}

impl From<LegacyGame> for Game {
    fn from(legacy: LegacyGame) -> Self {
        Self {
            team_name: legacy.team_name,
            opponent_name: legacy.opponent_name,
            home_score: legacy.home_score,
            away_score: legacy.away_score,
            game_date: legacy.game_date,
            period_count: legacy.period_count,
            period_duration_min: legacy.period_duration_min,
            team_id: legacy.team_id,
            season_id: legacy.season_id,
            tournament_id: legacy.tournament_id,
            events: legacy.events.into_iter().map(GameEvent::from).collect(),
            positions: Vec::new(),
            game_personnel: Vec::new(),
            is_played: legacy.is_played,
        }
    }
}

/// A version-1 game event, timed in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyEvent {
    /// Kind of event.
    #[serde(rename = "type")]
    pub kind: LegacyEventKind,
    /// Clock time in milliseconds from kickoff.
    pub time_ms: u64,
    /// Scoring player, for goals.
    #[serde(default)]
    pub scorer_id: Option<EntityId>,
    /// Assisting player, for goals.
    #[serde(default)]
    pub assister_id: Option<EntityId>,
}

impl From<LegacyEvent> for GameEvent {
    fn from(legacy: LegacyEvent) -> Self {
        Self {
            kind: legacy.kind.into(),
            time_seconds: legacy.time_ms / 1000,
            scorer_id: legacy.scorer_id,
            assister_id: legacy.assister_id,
        }
    }
}

/// Event kinds as version 1 spelled them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LegacyEventKind {
    /// Our side scored.
    Goal,
    /// The opponent scored.
    OpponentGoal,
    /// A substitution was made.
    Substitution,
    /// A period ended.
    PeriodEnd,
    /// The game ended.
    GameEnd,
    /// A fair-play card was awarded.
    FairPlayCard,
}

impl From<LegacyEventKind> for GameEventKind {
    fn from(legacy: LegacyEventKind) -> Self {
        match legacy {
            LegacyEventKind::Goal => Self::Goal,
            LegacyEventKind::OpponentGoal => Self::OpponentGoal,
            LegacyEventKind::Substitution => Self::Substitution,
            LegacyEventKind::PeriodEnd => Self::PeriodEnd,
            LegacyEventKind::GameEnd => Self::GameEnd,
            LegacyEventKind::FairPlayCard => Self::FairPlayCard,
        }
    }
}

/// Version-1 settings; only the language survived to the archive.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySettings {
    /// UI language tag.
    #[serde(default)]
    pub language: Option<String>,
}

impl From<LegacySettings> for AppSettings {
    fn from(legacy: LegacySettings) -> Self {
        let mut settings = Self::default();
        if let Some(language) = legacy.language {
            settings.language = language;
        }
        settings
    }
}

struct ConvertedArchive {
    players: Vec<Player>,
    teams: Vec<Team>,
    rosters: BTreeMap<EntityId, Vec<TeamPlayer>>,
    seasons: Vec<Season>,
    tournaments: Vec<Tournament>,
    games: BTreeMap<EntityId, Game>,
    settings: Option<AppSettings>,
}

fn convert_archive(archive: LegacyArchive) -> ConvertedArchive {
    ConvertedArchive {
        players: archive.roster.into_iter().map(Player::from).collect(),
        teams: archive.teams.into_iter().map(Team::from).collect(),
        rosters: archive
            .team_rosters
            .into_iter()
            .map(|(team_id, entries)| {
                let converted = entries
                    .into_iter()
                    .map(|entry| entry.into_entry(team_id.clone()))
                    .collect();
                (team_id, converted)
            })
            .collect(),
        seasons: archive.seasons.into_iter().map(Season::from).collect(),
        tournaments: archive
            .tournaments
            .into_iter()
            .map(Tournament::from)
            .collect(),
        games: archive
            .games
            .into_iter()
            .map(|(id, game)| (id, Game::from(game)))
            .collect(),
        settings: archive.settings.map(AppSettings::from),
    }
}

/// Imports a version-1 archive into an empty local store.
///
/// A store that already holds players, teams, or games skips the
/// import entirely: the report comes back successful with `skipped`
/// set, so re-launching the app with an old archive on disk is
/// harmless. Collections are written one at a time and the first
/// failed write stops the run; whatever landed stays in the report's
/// counts. The archive itself is never modified.
pub fn migrate_legacy(
    archive_json: &str,
    local: &dyn DataStore,
    observer: Option<&ProgressObserver>,
) -> MigrationReport {
    let mut report = MigrationReport::new(MigrationKind::Legacy);
    emit(observer, LegacyStage::Preparing.label(), report.migrated);

    match local.counts() {
        Ok(existing) if existing.players > 0 || existing.teams > 0 || existing.games > 0 => {
            report.skipped = true;
            report.record_warning("store already holds data; legacy import skipped");
            info!("legacy import skipped; the store is not empty");
            return report;
        }
        Ok(_) => {}
        Err(err) => {
            report.record_error(format!("reading the store failed: {err}"));
            return report;
        }
    }

    let archive: LegacyArchive = match serde_json::from_str(archive_json) {
        Ok(archive) => archive,
        Err(err) => {
            report.record_error(format!("archive did not parse: {err}"));
            return report;
        }
    };
    if archive.schema_version != LEGACY_SCHEMA_VERSION {
        report.record_error(format!(
            "unsupported archive schema version {} (expected {LEGACY_SCHEMA_VERSION})",
            archive.schema_version
        ));
        return report;
    }

    emit(observer, LegacyStage::Converting.label(), report.migrated);
    let converted = convert_archive(archive);

    emit(observer, LegacyStage::Writing.label(), report.migrated);
    match local.save_players(converted.players) {
        Ok(saved) => report.migrated.players = saved.len(),
        Err(err) => return abort_write(report, EntityKind::Players, &err),
    }
    match local.save_teams(converted.teams) {
        Ok(saved) => report.migrated.teams = saved.len(),
        Err(err) => return abort_write(report, EntityKind::Teams, &err),
    }
    for (team_id, entries) in converted.rosters {
        match local.save_team_roster(&team_id, entries) {
            Ok(saved) => report.migrated.rosters += saved.len(),
            Err(err) => return abort_write(report, EntityKind::Rosters, &err),
        }
    }
    match local.save_seasons(converted.seasons) {
        Ok(saved) => report.migrated.seasons = saved.len(),
        Err(err) => return abort_write(report, EntityKind::Seasons, &err),
    }
    match local.save_tournaments(converted.tournaments) {
        Ok(saved) => report.migrated.tournaments = saved.len(),
        Err(err) => return abort_write(report, EntityKind::Tournaments, &err),
    }
    match local.save_games(converted.games) {
        Ok(saved) => report.migrated.games = saved,
        Err(err) => return abort_write(report, EntityKind::Games, &err),
    }
    if let Some(settings) = converted.settings {
        match local.save_settings(settings) {
            Ok(_) => report.migrated.has_settings = true,
            Err(err) => return abort_write(report, EntityKind::Settings, &err),
        }
    }

    emit(observer, LegacyStage::Complete.label(), report.migrated);
    info!(
        imported = report.migrated.total(),
        "legacy archive imported"
    );
    report
}

fn abort_write(
    mut report: MigrationReport,
    kind: EntityKind,
    err: &StoreError,
) -> MigrationReport {
    warn!(%kind, error = %err, "legacy import stopped at the first failed write");
    report.record_error(format!("{kind}: {err}"));
    report
}
