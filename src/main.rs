use anyhow::Context;
use clap::Parser;
use r2g_migrate::config::{Cli, MigrationConfig};
use r2g_migrate::ledger::{self, RunStatus};
use r2g_migrate::pipeline::{self, MigrationReport};
use r2g_migrate::source::SourceData;
use r2g_migrate::{db, logging, snapshot};
use std::process::ExitCode;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let cfg = MigrationConfig::resolve(Cli::parse());
    if let Err(e) = logging::init_tracing("r2g_migrate=info") {
        eprintln!("{e}");
    }

    match run(&cfg) {
        Ok(report) => {
            if cfg.report_json {
                match serde_json::to_string_pretty(&report) {
                    Ok(s) => println!("{s}"),
                    Err(e) => warn!(error = %e, "failed to render report"),
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "migration failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: &MigrationConfig) -> anyhow::Result<MigrationReport> {
    let (source, digests) = SourceData::load_with_digests(&cfg.players_path, &cfg.managers_path)?;
    info!(
        players = source.players.len(),
        managers = source.managers.len(),
        "source documents loaded"
    );

    if let Some(dir) = cfg.snapshot_dir.as_deref() {
        match snapshot::export_snapshot(&cfg.db_path, dir)? {
            Some(s) => info!(path = %s.path.to_string_lossy(), "database snapshot written"),
            None => info!("no existing database; snapshot skipped"),
        }
    }

    let mut conn = db::open_db(&cfg.db_path)?;
    let run_id = ledger::begin_run(&conn, &digests, cfg.chunk_size)?;
    info!(run_id = %run_id, db = %cfg.db_path.to_string_lossy(), "migration run started");

    let report = match pipeline::run_migration(&mut conn, &source, cfg.chunk_size) {
        Ok(report) => report,
        Err(aborted) => {
            let message = aborted.to_string();
            if let Err(e) = ledger::finish_run(
                &conn,
                &run_id,
                RunStatus::Failed,
                Some(&aborted.report),
                Some(&message),
            ) {
                warn!(error = %format!("{e:#}"), "failed to record run failure");
            }
            return Err(aborted).context("migration did not complete");
        }
    };

    let status = RunStatus::for_report(&report);
    ledger::finish_run(&conn, &run_id, status, Some(&report), None)?;

    for (table, n) in db::table_counts(&conn)? {
        info!(table = %table, rows = n, "table count");
    }
    if status == RunStatus::Partial {
        warn!(
            dropped = report.total_dropped(),
            "some batches were rejected; see the stage report"
        );
    }
    info!(run_id = %run_id, status = status.as_str(), "migration run finished");
    Ok(report)
}
