//! Command line and environment configuration.
//!
//! Flags win over environment variables, which win over defaults. A `.env`
//! file in the working directory is loaded once before the environment is read.

use crate::loader::DEFAULT_CHUNK_SIZE;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Once;

pub const ENV_PLAYERS: &str = "R2G_PLAYERS_PATH";
pub const ENV_MANAGERS: &str = "R2G_MANAGERS_PATH";
pub const ENV_DB: &str = "R2G_DB_PATH";
pub const ENV_CHUNK_SIZE: &str = "R2G_CHUNK_SIZE";
pub const ENV_SNAPSHOT_DIR: &str = "R2G_SNAPSHOT_DIR";

static INIT: Once = Once::new();

pub fn init_env() {
    INIT.call_once(|| {
        let _ = dotenv::dotenv();
    });
}

#[derive(Parser, Debug, Default)]
#[command(
    name = "r2g-migrate",
    version,
    about = "Load the Road to Glory player and manager JSON files into the relational store"
)]
pub struct Cli {
    /// Flat player list (players.json)
    #[arg(long)]
    pub players: Option<PathBuf>,

    /// Nested manager/season/squad document (manager_data.json)
    #[arg(long)]
    pub managers: Option<PathBuf>,

    /// Target SQLite database file
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Rows per insert batch
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Zip the existing database here before writing
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,

    /// Print the stage report as JSON on stdout
    #[arg(long, default_value_t = false)]
    pub report_json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub players_path: PathBuf,
    pub managers_path: PathBuf,
    pub db_path: PathBuf,
    pub chunk_size: usize,
    pub snapshot_dir: Option<PathBuf>,
    pub report_json: bool,
}

impl MigrationConfig {
    pub fn resolve(cli: Cli) -> Self {
        init_env();
        Self::from_sources(cli, |key| match std::env::var(key) {
            Ok(v) if !v.trim().is_empty() => Some(v),
            _ => None,
        })
    }

    pub fn from_sources<F>(cli: Cli, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path_or = |flag: Option<PathBuf>, key: &str, default: &str| {
            flag.or_else(|| env(key).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(default))
        };

        let chunk_size = cli
            .chunk_size
            .or_else(|| env(ENV_CHUNK_SIZE).and_then(|v| v.trim().parse().ok()))
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_CHUNK_SIZE);

        Self {
            players_path: path_or(cli.players, ENV_PLAYERS, "players.json"),
            managers_path: path_or(cli.managers, ENV_MANAGERS, "manager_data.json"),
            db_path: path_or(cli.db, ENV_DB, "road_to_glory.sqlite3"),
            chunk_size,
            snapshot_dir: cli
                .snapshot_dir
                .or_else(|| env(ENV_SNAPSHOT_DIR).map(PathBuf::from)),
            report_json: cli.report_json,
        }
    }
}
