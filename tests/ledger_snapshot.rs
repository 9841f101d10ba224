use r2g_migrate::ledger::{self, RunStatus};
use r2g_migrate::pipeline::run_migration;
use r2g_migrate::source::SourceData;
use r2g_migrate::{db, snapshot};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
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

const PLAYERS: &str = r#"{"players": [
    {"id": 3, "name": "L. NINE", "club": "Rovers", "position": "CF", "value": "12.5", "gamesPlayed": "40"}
]}"#;

const MANAGERS: &str = r#"[
    {"name": "Coach", "club": "Rovers", "age": "51", "r2g_coin_balance": "-",
     "squad": {"players": [{"name": "L. NINE", "position": "CF", "type": "prime legend", "contract": 2}]}}
]"#;

#[test]
fn source_files_load_from_disk_and_run_is_recorded() {
    let dir = temp_dir("r2g-ledger");
    let players_path = dir.join("players.json");
    let managers_path = dir.join("manager_data.json");
    std::fs::write(&players_path, PLAYERS).expect("write players");
    std::fs::write(&managers_path, MANAGERS).expect("write managers");

    let (source, digests) =
        SourceData::load_with_digests(&players_path, &managers_path).expect("load sources");
    assert_eq!(source.players.len(), 1);
    assert_eq!(source.managers.len(), 1);

    // Rewriting the file after loading does not change what is recorded.
    std::fs::write(&players_path, "[]").expect("rewrite players");

    let mut conn = db::open_db(&dir.join("out").join("r2g.sqlite3")).expect("open db");
    let run_id = ledger::begin_run(&conn, &digests, 25).expect("begin run");

    let running = ledger::latest_run(&conn).expect("query").expect("run row");
    assert_eq!(running.id, run_id);
    assert_eq!(running.status, "running");
    assert_eq!(running.chunk_size, 25);
    assert!(running.finished_at.is_none());
    assert_eq!(running.players_sha256, ledger::sha256_hex(PLAYERS.as_bytes()));
    assert_ne!(running.players_sha256, ledger::sha256_hex(b"[]"));
    assert_eq!(running.managers_sha256, ledger::sha256_hex(MANAGERS.as_bytes()));
    assert_eq!(running.players_sha256.len(), 64);

    let report = run_migration(&mut conn, &source, 25).expect("migration");
    let status = RunStatus::for_report(&report);
    assert_eq!(status, RunStatus::Succeeded);
    ledger::finish_run(&conn, &run_id, status, Some(&report), None).expect("finish run");

    let done = ledger::latest_run(&conn).expect("query").expect("run row");
    assert_eq!(done.status, "succeeded");
    assert!(done.finished_at.is_some());
    assert!(done.error.is_none());
    let stored: serde_json::Value =
        serde_json::from_str(done.report_json.as_deref().expect("report json")).expect("parse");
    assert_eq!(stored["stages"][0]["stage"], "clubs");
    assert_eq!(stored["stages"][0]["inserted"], 1);

    let (value, games): (f64, i64) = conn
        .query_row("SELECT value, games_played FROM players WHERE id = 3", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .expect("player row");
    assert_eq!(value, 12.5);
    assert_eq!(games, 40);

    let (age, coins): (i64, i64) = conn
        .query_row("SELECT age, r2g_coin_balance FROM managers WHERE id = 1", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .expect("manager row");
    assert_eq!((age, coins), (51, 0));

    let (kind, contract): (String, Option<String>) = conn
        .query_row("SELECT player_type, contract FROM manager_squads", [], |r| {
            Ok((r.get(0)?, r.get(1)?))
        })
        .expect("squad row");
    assert_eq!(kind, "prime legend");
    assert_eq!(contract.as_deref(), Some("2"));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn failed_run_keeps_its_error() {
    let dir = temp_dir("r2g-ledger-failed");
    let players_path = dir.join("players.json");
    let managers_path = dir.join("manager_data.json");
    std::fs::write(&players_path, "[]").expect("write players");
    std::fs::write(&managers_path, "[]").expect("write managers");
    let (_, digests) =
        SourceData::load_with_digests(&players_path, &managers_path).expect("load sources");

    let conn = db::open_db(&dir.join("r2g.sqlite3")).expect("open db");
    let run_id = ledger::begin_run(&conn, &digests, 50).expect("begin run");
    ledger::finish_run(&conn, &run_id, RunStatus::Failed, None, Some("disk full"))
        .expect("finish run");

    let rec = ledger::latest_run(&conn).expect("query").expect("run row");
    assert_eq!(rec.status, "failed");
    assert_eq!(rec.error.as_deref(), Some("disk full"));
    assert!(rec.report_json.is_none());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn missing_source_file_is_an_error() {
    let dir = temp_dir("r2g-missing-source");
    let err = SourceData::load(&dir.join("players.json"), &dir.join("manager_data.json"))
        .expect_err("missing file");
    assert!(format!("{:#}", err).contains("players.json"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn snapshot_zips_manifest_and_database_bytes() {
    let workspace = temp_dir("r2g-snapshot-src");
    let out_dir = temp_dir("r2g-snapshot-out");

    let missing = snapshot::export_snapshot(&workspace.join("absent.sqlite3"), &out_dir)
        .expect("snapshot of missing db");
    assert!(missing.is_none());

    let db_path = workspace.join("road_to_glory.sqlite3");
    let bytes = b"sqlite-test-payload";
    std::fs::write(&db_path, bytes).expect("write source db");

    let summary = snapshot::export_snapshot(&db_path, &out_dir)
        .expect("export snapshot")
        .expect("snapshot written");
    assert_eq!(summary.entry_count, 2);
    assert_eq!(summary.db_entry, "db/road_to_glory.sqlite3");
    assert!(summary
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("road_to_glory-") && n.ends_with(".zip")));

    let f = File::open(&summary.path).expect("open snapshot");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name(snapshot::MANIFEST_ENTRY)
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    let manifest: serde_json::Value = serde_json::from_str(&manifest).expect("manifest json");
    assert_eq!(manifest["format"], snapshot::SNAPSHOT_FORMAT);
    assert_eq!(manifest["dbEntry"], "db/road_to_glory.sqlite3");

    let mut restored = Vec::new();
    archive
        .by_name("db/road_to_glory.sqlite3")
        .expect("database entry")
        .read_to_end(&mut restored)
        .expect("read database entry");
    assert_eq!(restored, bytes);

    let _ = std::fs::remove_dir_all(workspace);
    let _ = std::fs::remove_dir_all(out_dir);
}
