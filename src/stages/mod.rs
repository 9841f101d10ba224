//! Entity insertion stages. Each stage turns source records plus the id maps
//! of earlier stages into rows, pushes them through the chunked loader, and
//! builds its own id map from what the store returned.

pub mod awards;
pub mod clubs;
pub mod competitions;
pub mod managers;
pub mod players;
pub mod seasons;
pub mod squads;

use crate::coerce::to_safe_integer;
use crate::loader::{ChunkFailure, LoadOutcome, TableSpec};
use crate::source::MatchCounters;
use rusqlite::types::Value;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: &'static str,
    pub table: &'static str,
    pub attempted: usize,
    pub inserted: usize,
    pub failed_chunks: usize,
    pub dropped_rows: usize,
    /// Source entries skipped (or stored with a null link) because a
    /// referenced row was never stored.
    pub unresolved: usize,
    pub fatal: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ChunkFailure>,
}

impl StageReport {
    pub fn new(
        stage: &'static str,
        table: &TableSpec,
        attempted: usize,
        unresolved: usize,
        outcome: &LoadOutcome,
    ) -> Self {
        let report = Self {
            stage,
            table: table.name,
            attempted,
            inserted: outcome.rows().len(),
            failed_chunks: outcome.failures().len(),
            dropped_rows: outcome.dropped_rows(),
            unresolved,
            fatal: outcome.has_fatal(),
            failures: outcome.failures().to_vec(),
        };
        info!(
            stage,
            table = table.name,
            attempted,
            inserted = report.inserted,
            dropped = report.dropped_rows,
            unresolved,
            "stage complete"
        );
        report
    }

    pub fn is_clean(&self) -> bool {
        self.failed_chunks == 0
    }
}

pub(crate) fn int(v: i64) -> Value {
    Value::Integer(v)
}

pub(crate) fn real(v: f64) -> Value {
    Value::Real(v)
}

pub(crate) fn text(v: &str) -> Value {
    Value::Text(v.to_string())
}

pub(crate) fn opt_text(v: Option<String>) -> Value {
    v.map(Value::Text).unwrap_or(Value::Null)
}

pub(crate) fn opt_int(v: Option<i64>) -> Value {
    v.map(Value::Integer).unwrap_or(Value::Null)
}

/// matches_played, wins, draws, losses, goals_scored, goals_conceded
pub(crate) fn counter_values(c: &MatchCounters) -> [Value; 6] {
    [
        int(to_safe_integer(&c.matches_played)),
        int(to_safe_integer(&c.wins)),
        int(to_safe_integer(&c.draws)),
        int(to_safe_integer(&c.losses)),
        int(to_safe_integer(&c.goals_scored)),
        int(to_safe_integer(&c.goals_conceded)),
    ]
}
