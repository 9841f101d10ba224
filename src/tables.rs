//! Insert descriptors for every target table. Column order here is the order
//! row builders must produce values in.

use crate::loader::TableSpec;

pub const CLUBS: TableSpec = TableSpec {
    name: "clubs",
    columns: &["name"],
};

pub const PLAYERS: TableSpec = TableSpec {
    name: "players",
    columns: &[
        "id",
        "name",
        "star",
        "level",
        "club_id",
        "position",
        "value",
        "games_played",
        "image_path",
    ],
};

pub const PLAYER_STATS: TableSpec = TableSpec {
    name: "player_stats",
    columns: &["player_id", "season", "team", "value", "apps"],
};

pub const MANAGERS: TableSpec = TableSpec {
    name: "managers",
    columns: &[
        "id",
        "name",
        "age",
        "club_id",
        "overall_rating",
        "r2g_coin_balance",
        "r2g_token_balance",
        "club_total_value",
        "star_rating",
        "manager_rating",
        "trophies",
        "awards",
        "current_season",
    ],
};

pub const MANAGER_PERFORMANCES: TableSpec = TableSpec {
    name: "manager_performances",
    columns: &[
        "manager_id",
        "matches_played",
        "wins",
        "draws",
        "losses",
        "goals_scored",
        "goals_conceded",
    ],
};

pub const COMPETITIONS: TableSpec = TableSpec {
    name: "competitions",
    columns: &["name"],
};

pub const SEASONS: TableSpec = TableSpec {
    name: "seasons",
    columns: &[
        "manager_id",
        "season_number",
        "manager_rank",
        "rank_point",
        "team_income",
        "team_expense",
        "team_profit",
        "session_rewards",
    ],
};

pub const SEASON_COMPETITIONS: TableSpec = TableSpec {
    name: "season_competitions",
    columns: &["season_id", "competition_id", "placement", "stage"],
};

pub const SEASON_STATS: TableSpec = TableSpec {
    name: "season_stats",
    columns: &[
        "season_id",
        "is_special_tour",
        "matches_played",
        "wins",
        "draws",
        "losses",
        "goals_scored",
        "goals_conceded",
    ],
};

pub const AWARDS: TableSpec = TableSpec {
    name: "awards",
    columns: &["name"],
};

pub const SEASON_AWARDS: TableSpec = TableSpec {
    name: "season_awards",
    columns: &["season_id", "award_id"],
};

pub const MANAGER_SQUADS: TableSpec = TableSpec {
    name: "manager_squads",
    columns: &[
        "manager_id",
        "player_name",
        "position",
        "value",
        "contract",
        "salary",
        "player_type",
        "player_id",
    ],
};

/// Insertion order; every table only references tables before it.
pub const ALL: [TableSpec; 12] = [
    CLUBS,
    PLAYERS,
    PLAYER_STATS,
    MANAGERS,
    MANAGER_PERFORMANCES,
    COMPETITIONS,
    SEASONS,
    SEASON_COMPETITIONS,
    SEASON_STATS,
    AWARDS,
    SEASON_AWARDS,
    MANAGER_SQUADS,
];
