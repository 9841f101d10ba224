use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn write_sources(dir: &Path) {
    std::fs::write(
        dir.join("players.json"),
        r#"[{"id": 1, "name": "A. TEST", "club": "Test FC", "position": "CDM", "value": 50}]"#,
    )
    .expect("write players");
    std::fs::write(
        dir.join("manager_data.json"),
        r#"[{"name": "Mgr1", "club": "Test FC", "squad": {"players": [{"name": "A. TEST"}]}}]"#,
    )
    .expect("write managers");
}

fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_r2g-migrate"))
        .current_dir(dir)
        .args(args)
        .env_remove("R2G_PLAYERS_PATH")
        .env_remove("R2G_MANAGERS_PATH")
        .env_remove("R2G_DB_PATH")
        .env_remove("R2G_CHUNK_SIZE")
        .env_remove("R2G_SNAPSHOT_DIR")
        .env("RUST_LOG", "off")
        .output()
        .expect("run r2g-migrate")
}

#[test]
fn cli_migrates_and_prints_report() {
    let dir = temp_dir("r2g-cli");
    write_sources(&dir);

    let out = run_cli(&dir, &["--report-json"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).expect("report json");
    assert_eq!(report["stages"].as_array().map(|s| s.len()), Some(12));

    let conn = Connection::open(dir.join("road_to_glory.sqlite3")).expect("open db");
    let linked: Option<i64> = conn
        .query_row("SELECT player_id FROM manager_squads", [], |r| r.get(0))
        .expect("squad row");
    assert_eq!(linked, Some(1));
    let status: String = conn
        .query_row("SELECT status FROM migration_runs", [], |r| r.get(0))
        .expect("run row");
    assert_eq!(status, "succeeded");
    drop(conn);

    // Second run into the same file: batches collide, the run is partial but
    // still exits cleanly, and the previous database is snapshotted first.
    let out = run_cli(&dir, &["--snapshot-dir", "snapshots"]);
    assert!(out.status.success());
    let snapshots = std::fs::read_dir(dir.join("snapshots"))
        .expect("snapshot dir")
        .count();
    assert_eq!(snapshots, 1);

    let conn = Connection::open(dir.join("road_to_glory.sqlite3")).expect("reopen db");
    let statuses: Vec<String> = {
        let mut stmt = conn
            .prepare("SELECT status FROM migration_runs ORDER BY started_at, rowid")
            .expect("prepare");
        let rows = stmt
            .query_map([], |r| r.get::<_, String>(0))
            .expect("query")
            .collect::<Result<Vec<_>, _>>()
            .expect("collect");
        rows
    };
    assert_eq!(statuses, vec!["succeeded", "partial"]);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn cli_fails_on_missing_source() {
    let dir = temp_dir("r2g-cli-missing");
    let out = run_cli(&dir, &["--players", "nope.json"]);
    assert!(!out.status.success());
    assert!(!dir.join("road_to_glory.sqlite3").exists());
    let _ = std::fs::remove_dir_all(dir);
}
