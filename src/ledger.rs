//! One row per migration attempt in `migration_runs`: which source files were
//! loaded (by digest), how it ended, and the stage report.

use crate::pipeline::MigrationReport;
use crate::source::SourceDigests;
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Succeeded,
    Partial,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        }
    }

    pub fn for_report(report: &MigrationReport) -> Self {
        if report.is_complete() {
            RunStatus::Succeeded
        } else {
            RunStatus::Partial
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub players_sha256: String,
    pub managers_sha256: String,
    pub chunk_size: i64,
    pub status: String,
    pub report_json: Option<String>,
    pub error: Option<String>,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(64);
    for b in digest {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub fn begin_run(
    conn: &Connection,
    digests: &SourceDigests,
    chunk_size: usize,
) -> anyhow::Result<String> {
    let id = Uuid::new_v4().to_string();
    let started_at = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO migration_runs(id, started_at, players_sha256, managers_sha256, chunk_size, status)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &id,
            &started_at,
            &digests.players_sha256,
            &digests.managers_sha256,
            chunk_size as i64,
            RunStatus::Running.as_str(),
        ),
    )
    .context("failed to record migration run")?;
    Ok(id)
}

pub fn finish_run(
    conn: &Connection,
    run_id: &str,
    status: RunStatus,
    report: Option<&MigrationReport>,
    error: Option<&str>,
) -> anyhow::Result<()> {
    let finished_at = chrono::Utc::now().to_rfc3339();
    let report_json = report
        .map(serde_json::to_string)
        .transpose()
        .context("failed to serialize migration report")?;
    conn.execute(
        "UPDATE migration_runs SET finished_at = ?, status = ?, report_json = ?, error = ? WHERE id = ?",
        (&finished_at, status.as_str(), &report_json, &error, run_id),
    )
    .context("failed to finish migration run")?;
    Ok(())
}

pub fn latest_run(conn: &Connection) -> anyhow::Result<Option<RunRecord>> {
    let rec = conn
        .query_row(
            "SELECT id, started_at, finished_at, players_sha256, managers_sha256, chunk_size, status, report_json, error
             FROM migration_runs ORDER BY started_at DESC, rowid DESC LIMIT 1",
            [],
            |r| {
                Ok(RunRecord {
                    id: r.get(0)?,
                    started_at: r.get(1)?,
                    finished_at: r.get(2)?,
                    players_sha256: r.get(3)?,
                    managers_sha256: r.get(4)?,
                    chunk_size: r.get(5)?,
                    status: r.get(6)?,
                    report_json: r.get(7)?,
                    error: r.get(8)?,
                })
            },
        )
        .optional()?;
    Ok(rec)
}
