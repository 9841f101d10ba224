use super::{int, opt_int, opt_text, real, text, StageReport};
use crate::coerce::{to_optional_text, to_safe_float};
use crate::ids::{ManagerMap, PlayerMap, Resolved};
use crate::loader::{insert_in_chunks, BulkInsert, SqlRow};
use crate::normalize::PlayerType;
use crate::source::ManagerRecord;
use crate::tables;
use tracing::debug;

/// Squad rows keep a copy of the player name; `player_id` is null when the
/// name has no stored player.
pub fn squad_rows(
    managers: &[ManagerRecord],
    manager_ids: &ManagerMap,
    players: &PlayerMap,
) -> (Vec<SqlRow>, usize) {
    let mut unresolved = 0usize;
    let mut rows = Vec::new();
    for m in managers {
        let squad = &m.squad.players;
        if squad.is_empty() {
            continue;
        }
        let Resolved::Found(manager_id) = manager_ids.resolve(m.name.as_str()) else {
            debug!(manager = %m.name, players = squad.len(), "manager not stored; skipping squad");
            unresolved += squad.len();
            continue;
        };
        for sp in squad {
            let player_id = match players.resolve(sp.name.as_str()) {
                Resolved::Found(id) => Some(id.0),
                Resolved::Missing => {
                    debug!(manager = %m.name, player = %sp.name, "squad player has no stored player");
                    unresolved += 1;
                    None
                }
            };
            rows.push(vec![
                int(manager_id.0),
                text(&sp.name),
                text(&sp.position),
                real(to_safe_float(&sp.value)),
                opt_text(to_optional_text(&sp.contract)),
                real(to_safe_float(&sp.salary)),
                text(PlayerType::parse(&sp.player_type).as_str()),
                opt_int(player_id),
            ]);
        }
    }
    (rows, unresolved)
}

pub fn load_manager_squads<S>(
    sink: &mut S,
    managers: &[ManagerRecord],
    manager_ids: &ManagerMap,
    players: &PlayerMap,
    chunk_size: usize,
) -> StageReport
where
    S: BulkInsert + ?Sized,
{
    let (rows, unresolved) = squad_rows(managers, manager_ids, players);
    let outcome = insert_in_chunks(sink, &tables::MANAGER_SQUADS, &rows, chunk_size);
    StageReport::new(
        "manager_squads",
        &tables::MANAGER_SQUADS,
        rows.len(),
        unresolved,
        &outcome,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ManagerId, PlayerId};
    use crate::source::parse_managers;
    use rusqlite::types::Value;

    #[test]
    fn squad_players_link_by_exact_name() {
        let managers = parse_managers(
            r#"[{"name": "Mgr1", "squad": {"players": [
                {"name": "A. TEST", "position": "DM", "value": 50, "contract": "S6", "salary": 2.5, "type": "standard"},
                {"name": "A. Test", "position": "ST", "value": "-", "type": "mythic"},
                {"name": "C. ICON", "position": "GK", "type": "prime legend"}
            ]}}]"#,
        )
        .expect("managers");
        let mut ids = ManagerMap::new();
        ids.insert("Mgr1".into(), ManagerId(1));
        let mut players = PlayerMap::new();
        players.insert("A. TEST".into(), PlayerId(1));

        let (rows, unresolved) = squad_rows(&managers, &ids, &players);
        assert_eq!(rows.len(), 3);
        assert_eq!(unresolved, 2);
        assert_eq!(rows[0][7], Value::Integer(1));
        assert_eq!(rows[0][4], Value::Text("S6".into()));
        assert_eq!(rows[0][5], Value::Real(2.5));
        assert_eq!(rows[1][7], Value::Null);
        assert_eq!(rows[1][6], Value::Text("standard".into()));
        assert_eq!(rows[1][3], Value::Real(0.0));
        assert_eq!(rows[2][6], Value::Text("prime legend".into()));
    }
}
