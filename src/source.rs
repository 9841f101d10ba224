//! Source documents as they appear in `players.json` and `manager_data.json`.
//!
//! Numeric fields are kept as raw JSON values; the data files mix numbers,
//! numeric strings and `"-"` placeholders, so conversion happens later through
//! the coercion helpers when rows are built.

use crate::ledger::sha256_hex;
use anyhow::Context;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default)]
    pub star: Value,
    #[serde(default)]
    pub level: Value,
    #[serde(default, deserialize_with = "lenient_string")]
    pub club: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub position: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, rename = "gamesPlayed")]
    pub games_played: Value,
    #[serde(default, rename = "imagePath")]
    pub image_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: Vec<StatRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub season: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub team: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub apps: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManagerRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default)]
    pub age: Value,
    #[serde(default, deserialize_with = "lenient_string")]
    pub club: String,
    #[serde(default)]
    pub overall_rating: Value,
    #[serde(default)]
    pub r2g_coin_balance: Value,
    #[serde(default)]
    pub r2g_token_balance: Value,
    #[serde(default)]
    pub club_total_value: Value,
    #[serde(default)]
    pub star_rating: Value,
    #[serde(default)]
    pub manager_rating: Value,
    #[serde(default)]
    pub trophies: Value,
    #[serde(default)]
    pub awards: Value,
    #[serde(default)]
    pub current_season: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub squad: Squad,
    #[serde(default)]
    pub performance: Option<MatchCounters>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seasons: Vec<SeasonRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Squad {
    #[serde(default, deserialize_with = "null_as_default")]
    pub players: Vec<SquadPlayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SquadPlayer {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub position: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub contract: Value,
    #[serde(default)]
    pub salary: Value,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub player_type: String,
}

/// Win/loss/goal counters shared by `performance`, `season_stats` and
/// `sp_tour_stats`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchCounters {
    #[serde(default, alias = "games_played")]
    pub matches_played: Value,
    #[serde(default)]
    pub wins: Value,
    #[serde(default)]
    pub draws: Value,
    #[serde(default)]
    pub losses: Value,
    #[serde(default, alias = "goals_for")]
    pub goals_scored: Value,
    #[serde(default, alias = "goals_against")]
    pub goals_conceded: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonRecord {
    #[serde(default)]
    pub number: Value,
    #[serde(default)]
    pub manager_rank: Value,
    #[serde(default)]
    pub rank_point: Value,
    #[serde(default)]
    pub team_income: Value,
    #[serde(default)]
    pub team_expense: Value,
    #[serde(default)]
    pub team_profit: Value,
    #[serde(default)]
    pub session_rewards: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub competitions: BTreeMap<String, CompetitionEntry>,
    #[serde(default)]
    pub season_stats: Option<MatchCounters>,
    #[serde(default)]
    pub sp_tour_stats: Option<MatchCounters>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub awards: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompetitionEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default)]
    pub placement: Value,
    #[serde(default)]
    pub stage: Value,
}

fn lenient_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlayersDocument {
    List(Vec<PlayerRecord>),
    Wrapped { players: Vec<PlayerRecord> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManagersDocument {
    List(Vec<ManagerRecord>),
    Wrapped { managers: Vec<ManagerRecord> },
}

#[derive(Debug, Clone, Default)]
pub struct SourceData {
    pub players: Vec<PlayerRecord>,
    pub managers: Vec<ManagerRecord>,
}

/// SHA-256 of the exact bytes that were parsed, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDigests {
    pub players_sha256: String,
    pub managers_sha256: String,
}

impl SourceData {
    pub fn load(players_path: &Path, managers_path: &Path) -> anyhow::Result<Self> {
        Ok(Self::load_with_digests(players_path, managers_path)?.0)
    }

    /// Reads each file once; the digests describe the data that was parsed.
    pub fn load_with_digests(
        players_path: &Path,
        managers_path: &Path,
    ) -> anyhow::Result<(Self, SourceDigests)> {
        let players_text = read_source(players_path, "players")?;
        let managers_text = read_source(managers_path, "manager")?;
        let data = Self {
            players: parse_players(&players_text).with_context(|| {
                format!("failed to parse players file {}", players_path.to_string_lossy())
            })?,
            managers: parse_managers(&managers_text).with_context(|| {
                format!("failed to parse manager file {}", managers_path.to_string_lossy())
            })?,
        };
        let digests = SourceDigests {
            players_sha256: sha256_hex(players_text.as_bytes()),
            managers_sha256: sha256_hex(managers_text.as_bytes()),
        };
        Ok((data, digests))
    }
}

fn read_source(path: &Path, kind: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {} file {}", kind, path.to_string_lossy()))
}

pub fn load_players(path: &Path) -> anyhow::Result<Vec<PlayerRecord>> {
    let text = read_source(path, "players")?;
    parse_players(&text)
        .with_context(|| format!("failed to parse players file {}", path.to_string_lossy()))
}

pub fn load_managers(path: &Path) -> anyhow::Result<Vec<ManagerRecord>> {
    let text = read_source(path, "manager")?;
    parse_managers(&text)
        .with_context(|| format!("failed to parse manager file {}", path.to_string_lossy()))
}

pub fn parse_players(text: &str) -> anyhow::Result<Vec<PlayerRecord>> {
    let doc: PlayersDocument = serde_json::from_str(text)?;
    Ok(match doc {
        PlayersDocument::List(v) => v,
        PlayersDocument::Wrapped { players } => players,
    })
}

pub fn parse_managers(text: &str) -> anyhow::Result<Vec<ManagerRecord>> {
    let doc: ManagersDocument = serde_json::from_str(text)?;
    Ok(match doc {
        ManagersDocument::List(v) => v,
        ManagersDocument::Wrapped { managers } => managers,
    })
}
