use super::{int, text, StageReport};
use crate::coerce::to_safe_integer;
use crate::extract::AWARD_KEYS;
use crate::ids::{AwardId, AwardMap, ManagerMap, Resolved, SeasonMap};
use crate::loader::{insert_in_chunks, BulkInsert, SqlRow};
use crate::source::ManagerRecord;
use crate::tables;
use serde_json::Value as JsonValue;
use tracing::debug;

/// The award catalogue is fixed; it is never derived from the data files.
pub fn load_awards<S>(sink: &mut S, chunk_size: usize) -> (AwardMap, StageReport)
where
    S: BulkInsert + ?Sized,
{
    let rows: Vec<SqlRow> = AWARD_KEYS.iter().map(|k| vec![text(k)]).collect();
    let outcome = insert_in_chunks(sink, &tables::AWARDS, &rows, chunk_size);

    let mut awards = AwardMap::new();
    for r in outcome.rows() {
        if let (Some(id), Some(name)) = (r.id(), r.text("name")) {
            awards.insert(name.to_string(), AwardId(id));
        }
    }

    let report = StageReport::new("awards", &tables::AWARDS, rows.len(), 0, &outcome);
    (awards, report)
}

/// Only flags that are literally `true` produce a row.
pub fn season_award_rows(
    managers: &[ManagerRecord],
    manager_ids: &ManagerMap,
    seasons: &SeasonMap,
    awards: &AwardMap,
) -> (Vec<SqlRow>, usize) {
    let mut unresolved = 0usize;
    let mut rows = Vec::new();
    for m in managers {
        for s in &m.seasons {
            let won: Vec<&str> = s
                .awards
                .iter()
                .filter(|(_, flag)| matches!(flag, JsonValue::Bool(true)))
                .map(|(k, _)| k.as_str())
                .collect();
            if won.is_empty() {
                continue;
            }
            let number = to_safe_integer(&s.number);
            let season_id = match manager_ids.resolve(m.name.as_str()) {
                Resolved::Found(manager_id) => seasons.resolve(&(manager_id, number)).id(),
                Resolved::Missing => None,
            };
            let Some(season_id) = season_id else {
                unresolved += won.len();
                continue;
            };
            for key in won {
                match awards.resolve(key) {
                    Resolved::Found(award_id) => rows.push(vec![int(season_id.0), int(award_id.0)]),
                    Resolved::Missing => {
                        debug!(manager = %m.name, season = number, award = key, "award not stored");
                        unresolved += 1;
                    }
                }
            }
        }
    }
    (rows, unresolved)
}

pub fn load_season_awards<S>(
    sink: &mut S,
    managers: &[ManagerRecord],
    manager_ids: &ManagerMap,
    seasons: &SeasonMap,
    awards: &AwardMap,
    chunk_size: usize,
) -> StageReport
where
    S: BulkInsert + ?Sized,
{
    let (rows, unresolved) = season_award_rows(managers, manager_ids, seasons, awards);
    let outcome = insert_in_chunks(sink, &tables::SEASON_AWARDS, &rows, chunk_size);
    StageReport::new(
        "season_awards",
        &tables::SEASON_AWARDS,
        rows.len(),
        unresolved,
        &outcome,
    )
}
