use anyhow::Context;
use serde_json::json;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const MANIFEST_ENTRY: &str = "manifest.json";
pub const SNAPSHOT_FORMAT: &str = "r2g-db-snapshot-v1";

#[derive(Debug, Clone)]
pub struct SnapshotSummary {
    pub path: PathBuf,
    pub db_entry: String,
    pub entry_count: usize,
}

/// Zip the existing target database into `out_dir` before it is written to.
/// Returns `None` when there is no database file yet.
pub fn export_snapshot(db_path: &Path, out_dir: &Path) -> anyhow::Result<Option<SnapshotSummary>> {
    if !db_path.is_file() {
        return Ok(None);
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create directory {}", out_dir.to_string_lossy()))?;

    let file_name = db_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("database.sqlite3")
        .to_string();
    let stem = db_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("database");
    let now = chrono::Utc::now();
    let out_path = out_dir.join(format!("{}-{}.zip", stem, now.format("%Y%m%dT%H%M%S%.3fZ")));
    let db_entry = format!("db/{}", file_name);

    let out_file = File::create(&out_path).with_context(|| {
        format!("failed to create snapshot file {}", out_path.to_string_lossy())
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = json!({
        "format": SNAPSHOT_FORMAT,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "createdAt": now.to_rfc3339(),
        "sourceDatabase": db_path.to_string_lossy(),
        "dbEntry": db_entry,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(db_entry.as_str(), opts)
        .context("failed to start database entry")?;
    let mut db_file = File::open(db_path)
        .with_context(|| format!("failed to open database {}", db_path.to_string_lossy()))?;
    std::io::copy(&mut db_file, &mut zip).context("failed to write database entry")?;

    zip.finish().context("failed to finalize snapshot")?;

    Ok(Some(SnapshotSummary {
        path: out_path,
        db_entry,
        entry_count: 2,
    }))
}
