//! One-shot download of the cloud back into the local store.

use crate::progress::{emit, DownloadStage, ProgressObserver};
use crate::result::{MigrationKind, MigrationReport};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use touchline_model::{EntityId, EntityKind, TeamPlayer};
use touchline_remote::{RemoteStore, OFFLINE_MESSAGE};
use touchline_store::{DataStore, StoreError, StoreResult};
use tracing::{info, warn};

/// What happens to the cloud copy after a successful download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloudCleanup {
    /// Leave the cloud data in place.
    #[default]
    Keep,
    /// Clear the cloud once the download has fully succeeded.
    Delete,
}

/// Flips the app back to local-only storage once the data is home.
///
/// The switch commits after a verified download and before any cloud
/// cleanup, so a crash in between leaves both copies intact.
pub trait ModeSwitch: Send + Sync {
    /// Persists the local-mode preference.
    fn commit_local_mode(&self) -> StoreResult<()>;
}

/// Kinds the migration cannot afford to lose. A failed save of one of
/// these fails the run; the rest merely warn.
fn is_critical(kind: EntityKind) -> bool {
    !matches!(
        kind,
        EntityKind::Adjustments | EntityKind::WarmupPlan | EntityKind::TimerState
    )
}

/// Downloads the entire cloud snapshot into the local store.
///
/// Each collection is replaced wholesale; rosters are rewritten per
/// team, covering teams that only exist locally so their stale entries
/// are cleared too. Singletons the cloud never held are left alone,
/// since the contract has no way to delete one.
///
/// On a verified success the mode switch is committed first and the
/// cloud cleared after (when requested); a failed cleanup downgrades
/// to a warning because the data is already safe.
pub fn migrate_cloud_to_local(
    remote: &RemoteStore,
    local: &dyn DataStore,
    cleanup: CloudCleanup,
    mode_switch: &dyn ModeSwitch,
    observer: Option<&ProgressObserver>,
) -> MigrationReport {
    let mut report = MigrationReport::new(MigrationKind::CloudToLocal);
    emit(observer, DownloadStage::Preparing.label(), report.migrated);

    if !remote.is_online() {
        report.record_error(OFFLINE_MESSAGE);
        return report;
    }

    emit(observer, DownloadStage::Downloading.label(), report.migrated);
    let snapshot = match remote.snapshot() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            report.record_error(format!("download failed: {err}"));
            return report;
        }
    };
    let expected = snapshot.counts();

    let mut failed_kinds: HashSet<EntityKind> = HashSet::new();
    let mut absent_singletons: Vec<EntityKind> = Vec::new();
    let tick = |report: &MigrationReport| {
        emit(observer, DownloadStage::Saving.label(), report.migrated);
    };
    tick(&report);

    match local.save_players(snapshot.players) {
        Ok(saved) => report.migrated.players = saved.len(),
        Err(err) => note_failure(&mut report, &mut failed_kinds, EntityKind::Players, &err),
    }
    tick(&report);
    match local.save_teams(snapshot.teams) {
        Ok(saved) => report.migrated.teams = saved.len(),
        Err(err) => note_failure(&mut report, &mut failed_kinds, EntityKind::Teams, &err),
    }
    tick(&report);

    // Group incoming entries per team and rewrite the union of teams
    // seen on either side, so a team dropped from the cloud does not
    // keep its old local roster.
    let mut incoming: BTreeMap<EntityId, Vec<TeamPlayer>> = BTreeMap::new();
    for entry in snapshot.rosters {
        incoming.entry(entry.team_id.clone()).or_default().push(entry);
    }
    let mut roster_teams: BTreeSet<EntityId> = incoming.keys().cloned().collect();
    match local.rosters() {
        Ok(existing) => roster_teams.extend(existing.into_iter().map(|e| e.team_id)),
        Err(err) => note_failure(&mut report, &mut failed_kinds, EntityKind::Rosters, &err),
    }
    for team_id in roster_teams {
        let entries = incoming.remove(&team_id).unwrap_or_default();
        let landed = entries.len();
        match local.save_team_roster(&team_id, entries) {
            Ok(_) => report.migrated.rosters += landed,
            Err(err) => note_failure(&mut report, &mut failed_kinds, EntityKind::Rosters, &err),
        }
    }
    tick(&report);

    match local.save_seasons(snapshot.seasons) {
        Ok(saved) => report.migrated.seasons = saved.len(),
        Err(err) => note_failure(&mut report, &mut failed_kinds, EntityKind::Seasons, &err),
    }
    tick(&report);
    match local.save_tournaments(snapshot.tournaments) {
        Ok(saved) => report.migrated.tournaments = saved.len(),
        Err(err) => note_failure(&mut report, &mut failed_kinds, EntityKind::Tournaments, &err),
    }
    tick(&report);
    match local.save_personnel(snapshot.personnel) {
        Ok(saved) => report.migrated.personnel = saved.len(),
        Err(err) => note_failure(&mut report, &mut failed_kinds, EntityKind::Personnel, &err),
    }
    tick(&report);
    match local.save_games(snapshot.games) {
        Ok(saved) => report.migrated.games = saved,
        Err(err) => note_failure(&mut report, &mut failed_kinds, EntityKind::Games, &err),
    }
    tick(&report);
    match local.save_stat_adjustments(snapshot.adjustments) {
        Ok(saved) => report.migrated.adjustments = saved.len(),
        Err(err) => note_failure(&mut report, &mut failed_kinds, EntityKind::Adjustments, &err),
    }
    tick(&report);

    match snapshot.settings {
        Some(settings) => match local.save_settings(settings) {
            Ok(_) => report.migrated.has_settings = true,
            Err(err) => note_failure(&mut report, &mut failed_kinds, EntityKind::Settings, &err),
        },
        None => absent_singletons.push(EntityKind::Settings),
    }
    match snapshot.warmup_plan {
        Some(plan) => match local.save_warmup_plan(plan) {
            Ok(_) => report.migrated.has_warmup_plan = true,
            Err(err) => {
                note_failure(&mut report, &mut failed_kinds, EntityKind::WarmupPlan, &err);
            }
        },
        None => absent_singletons.push(EntityKind::WarmupPlan),
    }
    match snapshot.timer_state {
        Some(state) => match local.save_timer_state(state) {
            Ok(_) => report.migrated.has_timer_state = true,
            Err(err) => {
                note_failure(&mut report, &mut failed_kinds, EntityKind::TimerState, &err);
            }
        },
        None => absent_singletons.push(EntityKind::TimerState),
    }
    tick(&report);

    emit(observer, DownloadStage::Verifying.label(), report.migrated);
    match local.counts() {
        Ok(actual) => {
            for mismatch in expected.mismatches(&actual) {
                // Save failures are already in the report, and a
                // singleton the cloud never held legitimately keeps
                // its local value.
                if failed_kinds.contains(&mismatch.kind)
                    || absent_singletons.contains(&mismatch.kind)
                {
                    continue;
                }
                report.record_error(format!("verification: {mismatch}"));
            }
        }
        Err(err) => report.record_error(format!("verification failed: {err}")),
    }

    if report.success {
        if let Err(err) = mode_switch.commit_local_mode() {
            report.record_error(format!("switching back to local mode failed: {err}"));
        }
    }

    if report.success && cleanup == CloudCleanup::Delete {
        match remote.clear_all() {
            Ok(()) => report.cloud_deleted = Some(true),
            Err(err) => {
                report.record_warning(format!("cloud cleanup failed: {err}"));
                report.cloud_deleted = Some(false);
            }
        }
    }

    if report.success {
        emit(observer, DownloadStage::Complete.label(), report.migrated);
        info!(
            pulled = report.migrated.total(),
            cleanup = ?cleanup,
            "cloud downloaded into the local store"
        );
    } else {
        warn!(
            errors = report.errors.len(),
            "cloud-to-local migration failed"
        );
    }
    report
}

fn note_failure(
    report: &mut MigrationReport,
    failed: &mut HashSet<EntityKind>,
    kind: EntityKind,
    err: &StoreError,
) {
    failed.insert(kind);
    let message = format!("{kind}: {err}");
    if is_critical(kind) {
        report.record_error(message);
    } else {
        report.record_warning(message);
    }
}
