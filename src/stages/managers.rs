use super::{counter_values, int, opt_int, real, text, StageReport};
use crate::coerce::{to_safe_float, to_safe_integer};
use crate::extract::FREE_AGENT;
use crate::ids::{ClubMap, ManagerId, ManagerMap, Resolved};
use crate::loader::{insert_in_chunks, BulkInsert, SqlRow};
use crate::source::ManagerRecord;
use crate::tables;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Manager ids are the 1-based position in the source document.
pub fn manager_rows(managers: &[ManagerRecord], clubs: &ClubMap) -> (Vec<SqlRow>, usize) {
    let mut unresolved = 0usize;
    let mut rows = Vec::with_capacity(managers.len());
    for (idx, m) in managers.iter().enumerate() {
        let club_id = if m.club.is_empty() || m.club == FREE_AGENT {
            None
        } else {
            match clubs.resolve(m.club.as_str()) {
                Resolved::Found(id) => Some(id.0),
                Resolved::Missing => {
                    debug!(manager = %m.name, club = %m.club, "club not stored; club_id left null");
                    unresolved += 1;
                    None
                }
            }
        };
        rows.push(vec![
            int(idx as i64 + 1),
            text(&m.name),
            int(to_safe_integer(&m.age)),
            opt_int(club_id),
            int(to_safe_integer(&m.overall_rating)),
            int(to_safe_integer(&m.r2g_coin_balance)),
            real(to_safe_float(&m.r2g_token_balance)),
            real(to_safe_float(&m.club_total_value)),
            real(to_safe_float(&m.star_rating)),
            int(to_safe_integer(&m.manager_rating)),
            int(to_safe_integer(&m.trophies)),
            int(to_safe_integer(&m.awards)),
            int(to_safe_integer(&m.current_season)),
        ]);
    }
    (rows, unresolved)
}

pub fn load_managers<S>(
    sink: &mut S,
    managers: &[ManagerRecord],
    clubs: &ClubMap,
    chunk_size: usize,
) -> (ManagerMap, StageReport)
where
    S: BulkInsert + ?Sized,
{
    let (rows, unresolved) = manager_rows(managers, clubs);
    let outcome = insert_in_chunks(sink, &tables::MANAGERS, &rows, chunk_size);

    let mut by_name = ManagerMap::new();
    for r in outcome.rows() {
        if let (Some(id), Some(name)) = (r.id(), r.text("name")) {
            by_name.insert(name.to_string(), ManagerId(id));
        }
    }

    let report = StageReport::new("managers", &tables::MANAGERS, rows.len(), unresolved, &outcome);
    (by_name, report)
}

/// One row per stored manager. Managers sharing a name all resolve to the
/// id of the last one, so only that record's block is kept; earlier ones are
/// counted as unresolved.
pub fn performance_rows(managers: &[ManagerRecord], ids: &ManagerMap) -> (Vec<SqlRow>, usize) {
    let mut unresolved = 0usize;
    let mut used: HashSet<ManagerId> = HashSet::new();
    let mut rows = Vec::new();
    for m in managers.iter().rev() {
        let Some(perf) = m.performance.as_ref() else {
            continue;
        };
        let Resolved::Found(manager_id) = ids.resolve(m.name.as_str()) else {
            debug!(manager = %m.name, "manager not stored; skipping performance");
            unresolved += 1;
            continue;
        };
        if !used.insert(manager_id) {
            warn!(manager = %m.name, id = manager_id.0, "duplicate manager name; performance skipped");
            unresolved += 1;
            continue;
        }
        let mut row = vec![int(manager_id.0)];
        row.extend(counter_values(perf));
        rows.push(row);
    }
    rows.reverse();
    (rows, unresolved)
}

pub fn load_manager_performances<S>(
    sink: &mut S,
    managers: &[ManagerRecord],
    ids: &ManagerMap,
    chunk_size: usize,
) -> StageReport
where
    S: BulkInsert + ?Sized,
{
    let (rows, unresolved) = performance_rows(managers, ids);
    let outcome = insert_in_chunks(sink, &tables::MANAGER_PERFORMANCES, &rows, chunk_size);
    StageReport::new(
        "manager_performances",
        &tables::MANAGER_PERFORMANCES,
        rows.len(),
        unresolved,
        &outcome,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ClubId;
    use crate::source::parse_managers;
    use rusqlite::types::Value;

    #[test]
    fn manager_ids_follow_document_order() {
        let managers = parse_managers(
            r#"[
                {"name": "Mgr1", "club": "Test FC", "age": "41", "r2g_token_balance": "2.5"},
                {"name": "Mgr2", "club": "Nowhere"}
            ]"#,
        )
        .expect("managers");
        let mut clubs = ClubMap::new();
        clubs.insert("Test FC".into(), ClubId(3));

        let (rows, unresolved) = manager_rows(&managers, &clubs);
        assert_eq!(unresolved, 1);
        assert_eq!(rows[0][0], Value::Integer(1));
        assert_eq!(rows[1][0], Value::Integer(2));
        assert_eq!(rows[0][2], Value::Integer(41));
        assert_eq!(rows[0][3], Value::Integer(3));
        assert_eq!(rows[0][6], Value::Real(2.5));
        assert_eq!(rows[1][3], Value::Null);
    }

    #[test]
    fn performances_need_a_stored_manager() {
        let managers = parse_managers(
            r#"[
                {"name": "Kept", "performance": {"wins": 4, "losses": "-"}},
                {"name": "Dropped", "performance": {"wins": 1}},
                {"name": "NoBlock"}
            ]"#,
        )
        .expect("managers");
        let mut ids = ManagerMap::new();
        ids.insert("Kept".into(), ManagerId(1));
        ids.insert("NoBlock".into(), ManagerId(3));

        let (rows, unresolved) = performance_rows(&managers, &ids);
        assert_eq!(rows.len(), 1);
        assert_eq!(unresolved, 1);
        assert_eq!(rows[0][0], Value::Integer(1));
        assert_eq!(rows[0][2], Value::Integer(4));
        assert_eq!(rows[0][4], Value::Integer(0));
    }

    #[test]
    fn shared_name_keeps_one_performance_per_id() {
        let managers = parse_managers(
            r#"[
                {"name": "Same", "performance": {"wins": 1}},
                {"name": "Other", "performance": {"wins": 2}},
                {"name": "Same", "performance": {"wins": 3}}
            ]"#,
        )
        .expect("managers");
        let mut ids = ManagerMap::new();
        ids.insert("Same".into(), ManagerId(1));
        ids.insert("Other".into(), ManagerId(2));
        ids.insert("Same".into(), ManagerId(3));

        let (rows, unresolved) = performance_rows(&managers, &ids);
        assert_eq!(unresolved, 1);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Value::Integer(2));
        assert_eq!(rows[1][0], Value::Integer(3));
        assert_eq!(rows[1][2], Value::Integer(3));
    }
}
