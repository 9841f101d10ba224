use crate::loader::{BatchError, BulkInsert, InsertedRow, SqlRow, TableSpec};
use crate::tables;
use anyhow::Context;
use rusqlite::limits::Limit;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode};
use std::collections::BTreeMap;
use std::path::Path;

pub fn open_db(db_path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open database {}", db_path.to_string_lossy()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    apply_schema(&conn)?;
    Ok(conn)
}

pub fn apply_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS clubs(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS players(
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            star INTEGER NOT NULL DEFAULT 0,
            level INTEGER NOT NULL DEFAULT 0,
            club_id INTEGER,
            position TEXT NOT NULL,
            value REAL NOT NULL DEFAULT 0,
            games_played INTEGER NOT NULL DEFAULT 0,
            image_path TEXT,
            FOREIGN KEY(club_id) REFERENCES clubs(id)
        )",
        [],
    )?;
    // Targets created before player images were tracked lack this column.
    ensure_column(conn, "players", "image_path", "TEXT")?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_players_club ON players(club_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_players_name ON players(name)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS player_stats(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id INTEGER NOT NULL,
            season TEXT NOT NULL,
            team TEXT NOT NULL,
            value REAL NOT NULL DEFAULT 0,
            apps INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(player_id) REFERENCES players(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_player_stats_player ON player_stats(player_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS managers(
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            age INTEGER NOT NULL DEFAULT 0,
            club_id INTEGER,
            overall_rating INTEGER NOT NULL DEFAULT 0,
            r2g_coin_balance INTEGER NOT NULL DEFAULT 0,
            r2g_token_balance REAL NOT NULL DEFAULT 0,
            club_total_value REAL NOT NULL DEFAULT 0,
            star_rating REAL NOT NULL DEFAULT 0,
            manager_rating INTEGER NOT NULL DEFAULT 0,
            trophies INTEGER NOT NULL DEFAULT 0,
            awards INTEGER NOT NULL DEFAULT 0,
            current_season INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(club_id) REFERENCES clubs(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS manager_performances(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            manager_id INTEGER NOT NULL UNIQUE,
            matches_played INTEGER NOT NULL DEFAULT 0,
            wins INTEGER NOT NULL DEFAULT 0,
            draws INTEGER NOT NULL DEFAULT 0,
            losses INTEGER NOT NULL DEFAULT 0,
            goals_scored INTEGER NOT NULL DEFAULT 0,
            goals_conceded INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(manager_id) REFERENCES managers(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS competitions(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS seasons(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            manager_id INTEGER NOT NULL,
            season_number INTEGER NOT NULL,
            manager_rank INTEGER NOT NULL DEFAULT 0,
            rank_point INTEGER NOT NULL DEFAULT 0,
            team_income REAL NOT NULL DEFAULT 0,
            team_expense REAL NOT NULL DEFAULT 0,
            team_profit REAL NOT NULL DEFAULT 0,
            session_rewards REAL NOT NULL DEFAULT 0,
            FOREIGN KEY(manager_id) REFERENCES managers(id),
            UNIQUE(manager_id, season_number)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_seasons_manager ON seasons(manager_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS season_competitions(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            season_id INTEGER NOT NULL,
            competition_id INTEGER NOT NULL,
            placement TEXT,
            stage TEXT,
            FOREIGN KEY(season_id) REFERENCES seasons(id),
            FOREIGN KEY(competition_id) REFERENCES competitions(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_season_competitions_season ON season_competitions(season_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS season_stats(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            season_id INTEGER NOT NULL,
            is_special_tour INTEGER NOT NULL DEFAULT 0,
            matches_played INTEGER NOT NULL DEFAULT 0,
            wins INTEGER NOT NULL DEFAULT 0,
            draws INTEGER NOT NULL DEFAULT 0,
            losses INTEGER NOT NULL DEFAULT 0,
            goals_scored INTEGER NOT NULL DEFAULT 0,
            goals_conceded INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(season_id) REFERENCES seasons(id),
            UNIQUE(season_id, is_special_tour)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS awards(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS season_awards(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            season_id INTEGER NOT NULL,
            award_id INTEGER NOT NULL,
            FOREIGN KEY(season_id) REFERENCES seasons(id),
            FOREIGN KEY(award_id) REFERENCES awards(id),
            UNIQUE(season_id, award_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS manager_squads(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            manager_id INTEGER NOT NULL,
            player_name TEXT NOT NULL,
            position TEXT NOT NULL DEFAULT '',
            value REAL NOT NULL DEFAULT 0,
            contract TEXT,
            salary REAL NOT NULL DEFAULT 0,
            player_type TEXT NOT NULL DEFAULT 'standard'
                CHECK(player_type IN ('standard', 'prime', 'icon', 'legend', 'prime legend')),
            player_id INTEGER,
            FOREIGN KEY(manager_id) REFERENCES managers(id),
            FOREIGN KEY(player_id) REFERENCES players(id)
        )",
        [],
    )?;
    // Squads written before player linking existed have no player_id.
    ensure_column(conn, "manager_squads", "player_id", "INTEGER REFERENCES players(id)")?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_manager_squads_manager ON manager_squads(manager_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS migration_runs(
            id TEXT PRIMARY KEY,
            started_at TEXT NOT NULL,
            finished_at TEXT,
            players_sha256 TEXT NOT NULL,
            managers_sha256 TEXT NOT NULL,
            chunk_size INTEGER NOT NULL,
            status TEXT NOT NULL,
            report_json TEXT,
            error TEXT
        )",
        [],
    )?;

    Ok(())
}

fn ensure_column(conn: &Connection, table: &str, column: &str, decl: &str) -> anyhow::Result<()> {
    if table_has_column(conn, table, column)? {
        return Ok(());
    }
    conn.execute(
        &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, decl),
        [],
    )
    .with_context(|| format!("failed to add {}.{}", table, column))?;
    Ok(())
}

pub fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Row count per target table, in insertion order.
pub fn table_counts(conn: &Connection) -> anyhow::Result<BTreeMap<String, i64>> {
    let mut out = BTreeMap::new();
    for table in tables::ALL {
        let n: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table.name), [], |r| r.get(0))
            .with_context(|| format!("failed to count {}", table.name))?;
        out.insert(table.name.to_string(), n);
    }
    Ok(out)
}

fn insert_sql(table: &TableSpec, row_count: usize) -> String {
    let placeholders = vec!["?"; table.columns.len()].join(", ");
    let tuple = format!("({})", placeholders);
    let values = vec![tuple; row_count].join(", ");
    format!(
        "INSERT INTO {}({}) VALUES {} RETURNING *",
        table.name,
        table.columns.join(", "),
        values
    )
}

/// Rows that fit in one statement without exceeding the bound-parameter limit.
fn rows_per_statement(variable_limit: i32, columns: usize) -> usize {
    let limit = usize::try_from(variable_limit).unwrap_or(0);
    (limit / columns.max(1)).max(1)
}

/// The SQLite message alone. Statement errors otherwise carry the whole
/// multi-row SQL text.
fn error_message(e: &rusqlite::Error) -> String {
    match e {
        rusqlite::Error::SqliteFailure(f, Some(msg)) => format!("{} ({:?})", msg, f.code),
        rusqlite::Error::SqliteFailure(f, None) => f.to_string(),
        rusqlite::Error::SqlInputError { error, msg, .. } => format!("{} ({:?})", msg, error.code),
        other => other.to_string(),
    }
}

fn classify(e: rusqlite::Error) -> BatchError {
    let message = error_message(&e);
    match &e {
        rusqlite::Error::SqliteFailure(f, _) | rusqlite::Error::SqlInputError { error: f, .. } => {
            match f.code {
                ErrorCode::ConstraintViolation | ErrorCode::TypeMismatch | ErrorCode::TooBig => {
                    BatchError::Rejected(message)
                }
                _ => BatchError::Fatal(message),
            }
        }
        rusqlite::Error::ToSqlConversionFailure(_) => BatchError::Rejected(message),
        _ => BatchError::Fatal(message),
    }
}

fn insert_statement(
    conn: &Connection,
    table: &TableSpec,
    rows: &[SqlRow],
) -> Result<Vec<InsertedRow>, BatchError> {
    let sql = insert_sql(table, rows.len());
    let mut stmt = conn.prepare(&sql).map_err(classify)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut out = Vec::with_capacity(rows.len());
    let mut result = stmt
        .query(params_from_iter(rows.iter().flatten()))
        .map_err(classify)?;
    while let Some(row) = result.next().map_err(classify)? {
        let mut values = Vec::with_capacity(names.len());
        for i in 0..names.len() {
            values.push(row.get::<_, Value>(i).map_err(classify)?);
        }
        out.push(InsertedRow::new(names.clone(), values));
    }
    Ok(out)
}

impl BulkInsert for Connection {
    fn insert_batch(
        &mut self,
        table: &TableSpec,
        rows: &[SqlRow],
    ) -> Result<Vec<InsertedRow>, BatchError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(bad) = rows.iter().find(|r| r.len() != table.columns.len()) {
            return Err(BatchError::Rejected(format!(
                "row has {} values, {} expects {}",
                bad.len(),
                table.name,
                table.columns.len()
            )));
        }

        // SQLite aborts a whole statement on a constraint failure, so a
        // single-statement batch leaves no rows behind when rejected.
        let per_statement = rows_per_statement(
            self.limit(Limit::SQLITE_LIMIT_VARIABLE_NUMBER),
            table.columns.len(),
        );
        if rows.len() <= per_statement {
            return insert_statement(self, table, rows);
        }

        // Too many parameters for one statement: split, and keep the batch
        // atomic with a savepoint. Dropping it unreleased rolls back.
        let sp = self.savepoint().map_err(classify)?;
        let mut out = Vec::with_capacity(rows.len());
        for part in rows.chunks(per_statement) {
            out.extend(insert_statement(&sp, table, part)?);
        }
        sp.commit().map_err(classify)?;
        Ok(out)
    }
}
