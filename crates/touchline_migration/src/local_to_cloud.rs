//! One-shot upload of everything local into the cloud.

use crate::progress::{emit, ProgressObserver, UploadStage};
use crate::result::{MigrationKind, MigrationReport};
use std::collections::{BTreeMap, HashSet};
use touchline_model::{integrity_warnings, EntityId, EntityKind, Game, Keyed, StoreSnapshot};
use touchline_remote::{RemoteRecord, RemoteStore, OFFLINE_MESSAGE};
use touchline_store::{read_snapshot, DataStore};
use tracing::{info, warn};

/// How the destination is treated before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Empty the cloud first; abort the whole run if that fails.
    #[default]
    Replace,
    /// Leave existing cloud data in place, warning if any is found.
    Merge,
}

/// Uploads the entire local store into the cloud.
///
/// Referential-integrity findings are warnings. Upload failures, a
/// failed clear in replace mode, and count mismatches after upload are
/// errors. Ids are preserved verbatim, so re-running a partially
/// failed migration converges instead of duplicating.
///
/// In replace mode a failed clear aborts the run before a single
/// upsert. In merge mode verification only flags shortfalls, since
/// pre-existing cloud data legitimately inflates the destination.
pub fn migrate_local_to_cloud(
    local: &dyn DataStore,
    remote: &RemoteStore,
    mode: WriteMode,
    observer: Option<&ProgressObserver>,
) -> MigrationReport {
    let mut report = MigrationReport::new(MigrationKind::LocalToCloud);
    emit(observer, UploadStage::Preparing.label(), report.migrated);

    if !remote.is_online() {
        report.record_error(OFFLINE_MESSAGE);
        return report;
    }

    emit(observer, UploadStage::Exporting.label(), report.migrated);
    let snapshot = match read_snapshot(local) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            report.record_error(format!("export failed: {err}"));
            return report;
        }
    };
    let expected = snapshot.counts();

    emit(observer, UploadStage::Validating.label(), report.migrated);
    for finding in integrity_warnings(&snapshot) {
        report.record_warning(finding);
    }

    match mode {
        WriteMode::Replace => {
            emit(observer, UploadStage::Clearing.label(), report.migrated);
            if let Err(err) = remote.clear_all() {
                warn!(error = %err, "replace-mode clear failed; aborting before any upload");
                report.record_error(format!("clearing the cloud failed: {err}"));
                return report;
            }
        }
        WriteMode::Merge => match remote.counts() {
            Ok(existing) if existing.total() > 0 => {
                report.record_warning(format!(
                    "cloud already holds {} entities; merge may overwrite them",
                    existing.total()
                ));
            }
            Ok(_) => {}
            Err(err) => {
                report.record_error(format!("reading cloud counts failed: {err}"));
                return report;
            }
        },
    }

    let StoreSnapshot {
        players,
        teams,
        rosters,
        seasons,
        tournaments,
        personnel,
        games,
        adjustments,
        settings,
        warmup_plan,
        timer_state,
        ..
    } = snapshot;

    let mut failed_kinds: HashSet<EntityKind> = HashSet::new();
    let tick = |report: &MigrationReport| {
        emit(observer, UploadStage::Uploading.label(), report.migrated);
    };
    tick(&report);

    let landed = upload_keyed(remote, players, RemoteRecord::Player, &mut report, &mut failed_kinds);
    report.migrated.players = landed;
    tick(&report);
    let landed = upload_keyed(remote, teams, RemoteRecord::Team, &mut report, &mut failed_kinds);
    report.migrated.teams = landed;
    tick(&report);
    let landed = upload_keyed(remote, rosters, RemoteRecord::Roster, &mut report, &mut failed_kinds);
    report.migrated.rosters = landed;
    tick(&report);
    let landed = upload_keyed(remote, seasons, RemoteRecord::Season, &mut report, &mut failed_kinds);
    report.migrated.seasons = landed;
    tick(&report);
    let landed = upload_keyed(
        remote,
        tournaments,
        RemoteRecord::Tournament,
        &mut report,
        &mut failed_kinds,
    );
    report.migrated.tournaments = landed;
    tick(&report);
    let landed = upload_keyed(
        remote,
        personnel,
        RemoteRecord::Personnel,
        &mut report,
        &mut failed_kinds,
    );
    report.migrated.personnel = landed;
    tick(&report);
    let landed = upload_games(remote, games, &mut report, &mut failed_kinds);
    report.migrated.games = landed;
    tick(&report);
    let landed = upload_keyed(
        remote,
        adjustments,
        RemoteRecord::Adjustment,
        &mut report,
        &mut failed_kinds,
    );
    report.migrated.adjustments = landed;
    tick(&report);

    report.migrated.has_settings = upload_singleton(
        remote,
        EntityKind::Settings,
        settings.map(RemoteRecord::Settings),
        &mut report,
        &mut failed_kinds,
    );
    report.migrated.has_warmup_plan = upload_singleton(
        remote,
        EntityKind::WarmupPlan,
        warmup_plan.map(RemoteRecord::WarmupPlan),
        &mut report,
        &mut failed_kinds,
    );
    report.migrated.has_timer_state = upload_singleton(
        remote,
        EntityKind::TimerState,
        timer_state.map(RemoteRecord::TimerState),
        &mut report,
        &mut failed_kinds,
    );
    tick(&report);

    emit(observer, UploadStage::Verifying.label(), report.migrated);
    match remote.counts() {
        Ok(actual) => {
            for mismatch in expected.mismatches(&actual) {
                // Kinds with individual upload errors are already in
                // the report; re-flagging the count adds nothing.
                if failed_kinds.contains(&mismatch.kind) {
                    continue;
                }
                let shortfall = mismatch.actual < mismatch.expected;
                if mode == WriteMode::Replace || shortfall {
                    report.record_error(format!("verification: {mismatch}"));
                }
            }
        }
        Err(err) => report.record_error(format!("verification failed: {err}")),
    }

    if report.success {
        emit(observer, UploadStage::Complete.label(), report.migrated);
        info!(
            pushed = report.migrated.total(),
            mode = ?mode,
            "local store uploaded to the cloud"
        );
    } else {
        warn!(
            errors = report.errors.len(),
            "local-to-cloud migration failed"
        );
    }
    report
}

fn upload_keyed<T: Keyed>(
    remote: &RemoteStore,
    items: Vec<T>,
    wrap: impl Fn(T) -> RemoteRecord,
    report: &mut MigrationReport,
    failed: &mut HashSet<EntityKind>,
) -> usize {
    let mut landed = 0;
    for item in items {
        let id = item.key().clone();
        match remote.replay_upsert(wrap(item)) {
            Ok(()) => landed += 1,
            Err(err) => {
                failed.insert(T::KIND);
                report.record_error(format!("{} {id}: {err}", T::KIND));
            }
        }
    }
    landed
}

fn upload_games(
    remote: &RemoteStore,
    games: BTreeMap<EntityId, Game>,
    report: &mut MigrationReport,
    failed: &mut HashSet<EntityKind>,
) -> usize {
    let mut landed = 0;
    for (id, game) in games {
        let key = id.clone();
        match remote.replay_upsert(RemoteRecord::Game { id, game }) {
            Ok(()) => landed += 1,
            Err(err) => {
                failed.insert(EntityKind::Games);
                report.record_error(format!("{} {key}: {err}", EntityKind::Games));
            }
        }
    }
    landed
}

fn upload_singleton(
    remote: &RemoteStore,
    kind: EntityKind,
    record: Option<RemoteRecord>,
    report: &mut MigrationReport,
    failed: &mut HashSet<EntityKind>,
) -> bool {
    let Some(record) = record else {
        return false;
    };
    match remote.replay_upsert(record) {
        Ok(()) => true,
        Err(err) => {
            failed.insert(kind);
            report.record_error(format!("{kind}: {err}"));
            false
        }
    }
}
