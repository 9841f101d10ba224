//! Seasons and the two tables hanging off them.
//!
//! Season ids are assigned by the store. The `(manager, season number)` ->
//! id map is rebuilt from the insert result before any child row is built,
//! so children can only point at seasons that were actually stored.

use super::{counter_values, int, opt_text, real, StageReport};
use crate::coerce::{to_optional_text, to_safe_float, to_safe_integer};
use crate::ids::{CompetitionMap, ManagerId, ManagerMap, Resolved, SeasonId, SeasonMap};
use crate::loader::{insert_in_chunks, BulkInsert, InsertedRow, SqlRow};
use crate::source::ManagerRecord;
use crate::tables;
use std::collections::HashSet;
use tracing::{debug, warn};

pub fn season_rows(managers: &[ManagerRecord], ids: &ManagerMap) -> (Vec<SqlRow>, usize) {
    let mut unresolved = 0usize;
    let mut seen: HashSet<(ManagerId, i64)> = HashSet::new();
    let mut rows = Vec::new();
    for m in managers {
        let Resolved::Found(manager_id) = ids.resolve(m.name.as_str()) else {
            if !m.seasons.is_empty() {
                debug!(manager = %m.name, seasons = m.seasons.len(), "manager not stored; skipping seasons");
            }
            unresolved += m.seasons.len();
            continue;
        };
        for s in &m.seasons {
            let number = to_safe_integer(&s.number);
            if !seen.insert((manager_id, number)) {
                warn!(manager = %m.name, season = number, "repeated season number; keeping first");
                continue;
            }
            rows.push(vec![
                int(manager_id.0),
                int(number),
                int(to_safe_integer(&s.manager_rank)),
                int(to_safe_integer(&s.rank_point)),
                real(to_safe_float(&s.team_income)),
                real(to_safe_float(&s.team_expense)),
                real(to_safe_float(&s.team_profit)),
                real(to_safe_float(&s.session_rewards)),
            ]);
        }
    }
    (rows, unresolved)
}

pub fn season_map_from(stored: &[InsertedRow]) -> SeasonMap {
    let mut seasons = SeasonMap::new();
    for r in stored {
        if let (Some(id), Some(manager_id), Some(number)) =
            (r.id(), r.int("manager_id"), r.int("season_number"))
        {
            seasons.insert((ManagerId(manager_id), number), SeasonId(id));
        }
    }
    seasons
}

fn season_of(
    m: &ManagerRecord,
    number: i64,
    managers: &ManagerMap,
    seasons: &SeasonMap,
) -> Option<SeasonId> {
    let manager_id = managers.resolve(m.name.as_str()).id()?;
    seasons.resolve(&(manager_id, number)).id()
}

pub fn season_competition_rows(
    managers: &[ManagerRecord],
    manager_ids: &ManagerMap,
    seasons: &SeasonMap,
    competitions: &CompetitionMap,
) -> (Vec<SqlRow>, usize) {
    let mut unresolved = 0usize;
    let mut rows = Vec::new();
    for m in managers {
        for s in &m.seasons {
            if s.competitions.is_empty() {
                continue;
            }
            let number = to_safe_integer(&s.number);
            let Some(season_id) = season_of(m, number, manager_ids, seasons) else {
                unresolved += s.competitions.len();
                continue;
            };
            for (key, entry) in &s.competitions {
                let Resolved::Found(competition_id) = competitions.resolve(entry.name.as_str())
                else {
                    debug!(manager = %m.name, season = number, key = %key, competition = %entry.name, "competition not stored");
                    unresolved += 1;
                    continue;
                };
                rows.push(vec![
                    int(season_id.0),
                    int(competition_id.0),
                    opt_text(to_optional_text(&entry.placement)),
                    opt_text(to_optional_text(&entry.stage)),
                ]);
            }
        }
    }
    (rows, unresolved)
}

/// One regular row per season with `season_stats`, one special-tour row per
/// season with `sp_tour_stats`.
pub fn season_stat_rows(
    managers: &[ManagerRecord],
    manager_ids: &ManagerMap,
    seasons: &SeasonMap,
) -> (Vec<SqlRow>, usize) {
    let mut unresolved = 0usize;
    let mut rows = Vec::new();
    for m in managers {
        for s in &m.seasons {
            let blocks = [(false, s.season_stats.as_ref()), (true, s.sp_tour_stats.as_ref())];
            let wanted = blocks.iter().filter(|(_, b)| b.is_some()).count();
            if wanted == 0 {
                continue;
            }
            let number = to_safe_integer(&s.number);
            let Some(season_id) = season_of(m, number, manager_ids, seasons) else {
                unresolved += wanted;
                continue;
            };
            for (special, block) in blocks {
                let Some(counters) = block else {
                    continue;
                };
                let mut row = vec![int(season_id.0), int(i64::from(special))];
                row.extend(counter_values(counters));
                rows.push(row);
            }
        }
    }
    (rows, unresolved)
}

pub fn load_seasons<S>(
    sink: &mut S,
    managers: &[ManagerRecord],
    manager_ids: &ManagerMap,
    competitions: &CompetitionMap,
    chunk_size: usize,
) -> (SeasonMap, Vec<StageReport>)
where
    S: BulkInsert + ?Sized,
{
    let (rows, unresolved) = season_rows(managers, manager_ids);
    let outcome = insert_in_chunks(sink, &tables::SEASONS, &rows, chunk_size);
    let seasons = season_map_from(outcome.rows());
    let mut reports = vec![StageReport::new(
        "seasons",
        &tables::SEASONS,
        rows.len(),
        unresolved,
        &outcome,
    )];
    if outcome.has_fatal() {
        return (seasons, reports);
    }

    let (rows, unresolved) = season_competition_rows(managers, manager_ids, &seasons, competitions);
    let outcome = insert_in_chunks(sink, &tables::SEASON_COMPETITIONS, &rows, chunk_size);
    reports.push(StageReport::new(
        "season_competitions",
        &tables::SEASON_COMPETITIONS,
        rows.len(),
        unresolved,
        &outcome,
    ));
    if outcome.has_fatal() {
        return (seasons, reports);
    }

    let (rows, unresolved) = season_stat_rows(managers, manager_ids, &seasons);
    let outcome = insert_in_chunks(sink, &tables::SEASON_STATS, &rows, chunk_size);
    reports.push(StageReport::new(
        "season_stats",
        &tables::SEASON_STATS,
        rows.len(),
        unresolved,
        &outcome,
    ));

    (seasons, reports)
}
