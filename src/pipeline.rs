//! Orchestrates the nine insertion stages in dependency order.
//!
//! Id maps are passed from stage to stage by value; nothing is shared through
//! globals. A batch the store refuses is recorded and the run continues. A
//! fatal store failure stops the run after the stage it occurred in. Rows
//! stored before that point stay stored.

use crate::extract::{extract_clubs, extract_competitions};
use crate::loader::BulkInsert;
use crate::source::SourceData;
use crate::stages::{self, StageReport};
use serde::Serialize;
use std::fmt;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub stages: Vec<StageReport>,
}

impl MigrationReport {
    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == name)
    }

    pub fn is_complete(&self) -> bool {
        self.stages.iter().all(|s| s.is_clean())
    }

    pub fn total_inserted(&self) -> usize {
        self.stages.iter().map(|s| s.inserted).sum()
    }

    pub fn total_dropped(&self) -> usize {
        self.stages.iter().map(|s| s.dropped_rows).sum()
    }

    pub fn total_unresolved(&self) -> usize {
        self.stages.iter().map(|s| s.unresolved).sum()
    }
}

/// A run that stopped early. Carries whatever was reported up to the stop.
#[derive(Debug, Clone)]
pub struct MigrationAborted {
    pub stage: &'static str,
    pub message: String,
    pub report: MigrationReport,
}

impl fmt::Display for MigrationAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "migration aborted at stage {}: {}", self.stage, self.message)
    }
}

impl std::error::Error for MigrationAborted {}

struct Run {
    report: MigrationReport,
}

impl Run {
    fn record(&mut self, stage: StageReport) -> Result<(), MigrationAborted> {
        let fatal = stage
            .failures
            .iter()
            .find(|f| f.fatal)
            .map(|f| (stage.stage, f.message.clone()));
        self.report.stages.push(stage);
        match fatal {
            Some((name, message)) => {
                error!(stage = name, error = %message, "store failure; skipping remaining stages");
                Err(MigrationAborted {
                    stage: name,
                    message,
                    report: self.report.clone(),
                })
            }
            None => Ok(()),
        }
    }
}

pub fn run_migration<S>(
    sink: &mut S,
    source: &SourceData,
    chunk_size: usize,
) -> Result<MigrationReport, MigrationAborted>
where
    S: BulkInsert + ?Sized,
{
    let players = &source.players;
    let managers = &source.managers;
    let mut run = Run {
        report: MigrationReport::default(),
    };
    info!(
        players = players.len(),
        managers = managers.len(),
        chunk_size,
        "starting migration"
    );

    let club_names = extract_clubs(players, managers);
    let (clubs, r) = stages::clubs::load_clubs(sink, &club_names, chunk_size);
    run.record(r)?;

    let (stored_players, r) = stages::players::load_players(sink, players, &clubs, chunk_size);
    run.record(r)?;
    if stored_players.by_name.is_empty() && !players.is_empty() {
        warn!("no players stored; squad rows will carry null player ids");
    }

    run.record(stages::players::load_player_stats(
        sink,
        players,
        &stored_players.ids,
        chunk_size,
    ))?;

    let (manager_ids, r) = stages::managers::load_managers(sink, managers, &clubs, chunk_size);
    run.record(r)?;

    run.record(stages::managers::load_manager_performances(
        sink,
        managers,
        &manager_ids,
        chunk_size,
    ))?;

    let competition_names = extract_competitions(managers);
    let (competitions, r) =
        stages::competitions::load_competitions(sink, &competition_names, chunk_size);
    run.record(r)?;

    let (seasons, reports) =
        stages::seasons::load_seasons(sink, managers, &manager_ids, &competitions, chunk_size);
    for r in reports {
        run.record(r)?;
    }

    let (awards, r) = stages::awards::load_awards(sink, chunk_size);
    run.record(r)?;

    run.record(stages::awards::load_season_awards(
        sink,
        managers,
        &manager_ids,
        &seasons,
        &awards,
        chunk_size,
    ))?;

    run.record(stages::squads::load_manager_squads(
        sink,
        managers,
        &manager_ids,
        &stored_players.by_name,
        chunk_size,
    ))?;

    debug!(
        clubs = clubs.len(),
        players = stored_players.by_name.len(),
        managers = manager_ids.len(),
        competitions = competitions.len(),
        seasons = seasons.len(),
        awards = awards.len(),
        "id maps resolved"
    );
    let report = run.report;
    info!(
        inserted = report.total_inserted(),
        dropped = report.total_dropped(),
        unresolved = report.total_unresolved(),
        complete = report.is_complete(),
        "migration finished"
    );
    Ok(report)
}
