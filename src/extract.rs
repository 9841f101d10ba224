use crate::source::{ManagerRecord, PlayerRecord};
use std::collections::HashSet;

pub const FREE_AGENT: &str = "FREE AGENT";

pub const AWARD_KEYS: [&str; 4] = ["golden_boot", "golden_glove", "manager_of_season", "best_player"];

/// Unique club names in first-seen order: players first, then managers.
/// Names are compared exactly; "MAN CITY" and "MANCHESTER CITY" stay distinct.
pub fn extract_clubs(players: &[PlayerRecord], managers: &[ManagerRecord]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    let names = players
        .iter()
        .map(|p| p.club.as_str())
        .chain(managers.iter().map(|m| m.club.as_str()));
    for name in names {
        if name.is_empty() || name == FREE_AGENT {
            continue;
        }
        if seen.insert(name) {
            out.push(name.to_string());
        }
    }
    out
}

pub fn extract_competitions(managers: &[ManagerRecord]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for m in managers {
        for season in &m.seasons {
            for entry in season.competitions.values() {
                let name = entry.name.as_str();
                if name.is_empty() {
                    continue;
                }
                if seen.insert(name) {
                    out.push(name.to_string());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{parse_managers, parse_players};

    #[test]
    fn clubs_skip_free_agents_and_dedupe_exactly() {
        let players = parse_players(
            r#"[
                {"name": "A", "club": "Test FC"},
                {"name": "B", "club": "FREE AGENT"},
                {"name": "C", "club": "MAN CITY"},
                {"name": "D", "club": "Test FC"},
                {"name": "E"}
            ]"#,
        )
        .expect("players");
        let managers = parse_managers(
            r#"[{"name": "M1", "club": "MANCHESTER CITY"}, {"name": "M2", "club": "Test FC"}]"#,
        )
        .expect("managers");

        let clubs = extract_clubs(&players, &managers);
        assert_eq!(clubs, vec!["Test FC", "MAN CITY", "MANCHESTER CITY"]);
    }

    #[test]
    fn competitions_are_collected_across_all_seasons() {
        let managers = parse_managers(
            r#"[
                {"name": "M1", "seasons": [
                    {"number": 1, "competitions": {"a": {"name": "League"}, "b": {"name": "Cup"}}},
                    {"number": 2, "competitions": {"a": {"name": "League"}}}
                ]},
                {"name": "M2", "seasons": [
                    {"number": 1, "competitions": {"x": {"name": "Super Cup"}, "y": {"name": ""}}}
                ]}
            ]"#,
        )
        .expect("managers");

        let comps = extract_competitions(&managers);
        assert_eq!(comps, vec!["League", "Cup", "Super Cup"]);
    }
}
