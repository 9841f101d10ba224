use super::{int, opt_int, opt_text, real, text, StageReport};
use crate::coerce::{to_safe_float, to_safe_integer};
use crate::extract::FREE_AGENT;
use crate::ids::{ClubMap, PlayerId, PlayerMap, Resolved};
use crate::loader::{insert_in_chunks, BulkInsert, SqlRow};
use crate::normalize::normalize_position;
use crate::source::PlayerRecord;
use crate::tables;
use std::collections::HashSet;
use tracing::debug;

/// Rows for `players`, plus how many named clubs could not be resolved.
pub fn player_rows(players: &[PlayerRecord], clubs: &ClubMap) -> (Vec<SqlRow>, usize) {
    let mut unresolved = 0usize;
    let rows = players
        .iter()
        .map(|p| {
            let club_id = if p.club.is_empty() || p.club == FREE_AGENT {
                None
            } else {
                match clubs.resolve(p.club.as_str()) {
                    Resolved::Found(id) => Some(id.0),
                    Resolved::Missing => {
                        debug!(player = %p.name, club = %p.club, "club not stored; club_id left null");
                        unresolved += 1;
                        None
                    }
                }
            };
            vec![
                int(to_safe_integer(&p.id)),
                text(&p.name),
                int(to_safe_integer(&p.star)),
                int(to_safe_integer(&p.level)),
                opt_int(club_id),
                text(normalize_position(&p.position)),
                real(to_safe_float(&p.value)),
                int(to_safe_integer(&p.games_played)),
                opt_text(p.image_path.clone().filter(|s| !s.is_empty())),
            ]
        })
        .collect();
    (rows, unresolved)
}

/// What the players stage hands on: the name map used by squads, and every
/// id the store accepted (names may repeat, ids may not).
#[derive(Debug, Clone, Default)]
pub struct StoredPlayers {
    pub by_name: PlayerMap,
    pub ids: HashSet<PlayerId>,
}

pub fn load_players<S>(
    sink: &mut S,
    players: &[PlayerRecord],
    clubs: &ClubMap,
    chunk_size: usize,
) -> (StoredPlayers, StageReport)
where
    S: BulkInsert + ?Sized,
{
    let (rows, unresolved) = player_rows(players, clubs);
    let outcome = insert_in_chunks(sink, &tables::PLAYERS, &rows, chunk_size);

    let mut stored = StoredPlayers::default();
    for r in outcome.rows() {
        if let (Some(id), Some(name)) = (r.id(), r.text("name")) {
            stored.ids.insert(PlayerId(id));
            if let Some(prev) = stored.by_name.insert(name.to_string(), PlayerId(id)) {
                debug!(player = name, replaced = prev.0, id, "duplicate player name; keeping latest");
            }
        }
    }

    let report = StageReport::new("players", &tables::PLAYERS, rows.len(), unresolved, &outcome);
    (stored, report)
}

/// Stat rows carry the source player id directly, one row per `stats` entry.
/// Entries of players this run did not store are skipped and counted.
pub fn player_stat_rows(players: &[PlayerRecord], stored: &HashSet<PlayerId>) -> (Vec<SqlRow>, usize) {
    let mut unresolved = 0usize;
    let mut rows = Vec::new();
    for p in players {
        if p.stats.is_empty() {
            continue;
        }
        let player_id = to_safe_integer(&p.id);
        if !stored.contains(&PlayerId(player_id)) {
            debug!(player = %p.name, id = player_id, stats = p.stats.len(), "player not stored; skipping stats");
            unresolved += p.stats.len();
            continue;
        }
        for s in &p.stats {
            rows.push(vec![
                int(player_id),
                text(&s.season),
                text(&s.team),
                real(to_safe_float(&s.value)),
                int(to_safe_integer(&s.apps)),
            ]);
        }
    }
    (rows, unresolved)
}

pub fn load_player_stats<S>(
    sink: &mut S,
    players: &[PlayerRecord],
    stored: &HashSet<PlayerId>,
    chunk_size: usize,
) -> StageReport
where
    S: BulkInsert + ?Sized,
{
    let (rows, unresolved) = player_stat_rows(players, stored);
    let outcome = insert_in_chunks(sink, &tables::PLAYER_STATS, &rows, chunk_size);
    StageReport::new("player_stats", &tables::PLAYER_STATS, rows.len(), unresolved, &outcome)
}
