use std::fmt;

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};

/// Current schema version. Incremented when schema changes.
///
/// Opening an older store drops every collection and recreates it; records
/// written under a previous version are not migrated.
pub const SCHEMA_VERSION: u32 = 1;

/// A named record collection (one table each).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Games,
    Scenes,
    Players,
    Trackers,
    Traits,
    RollTables,
}

/// Secondary index available for scoped scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    Name,
    Game,
    Scene,
}

impl Index {
    pub fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Game => "game",
            Self::Scene => "scene",
        }
    }
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Self::Games,
        Self::Scenes,
        Self::Players,
        Self::Trackers,
        Self::Traits,
        Self::RollTables,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Self::Games => "games",
            Self::Scenes => "scenes",
            Self::Players => "players",
            Self::Trackers => "trackers",
            Self::Traits => "traits",
            Self::RollTables => "roll_tables",
        }
    }

    /// Data columns in record order, excluding `id`.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Games => &[
                "name",
                "ship_name",
                "momentum",
                "threat",
                "active_alert",
                "theme",
                "edition",
                "alt_font",
                "legacy_trackers",
                "ship_model",
                "ship_model_meta",
            ],
            Self::Scenes => &["game", "name", "description", "mission_track"],
            Self::Players => &[
                "game",
                "player_number",
                "name",
                "current_stress",
                "max_stress",
                "pips",
                "border_color",
                "image",
                "image_meta",
            ],
            Self::Trackers => &[
                "game",
                "name",
                "attribute",
                "department",
                "ship_system",
                "ship_department",
                "progress_track",
                "max_progress_track",
                "resistance",
                "complication_range",
                "breakthroughs",
            ],
            Self::Traits => &["scene", "name"],
            Self::RollTables => &["game", "name", "entries"],
        }
    }

    pub fn indexes(self) -> &'static [Index] {
        match self {
            Self::Games => &[Index::Name],
            Self::Scenes | Self::Players | Self::Trackers | Self::RollTables => {
                &[Index::Name, Index::Game]
            }
            Self::Traits => &[Index::Name, Index::Scene],
        }
    }

    pub fn has_index(self, index: Index) -> bool {
        self.indexes().contains(&index)
    }

    /// Row order for full and index scans.
    pub(crate) fn order_by(self) -> &'static str {
        match self {
            Self::Players => "player_number, id",
            _ => "id",
        }
    }

    fn create_table_sql(self) -> &'static str {
        match self {
            Self::Games => {
                "CREATE TABLE IF NOT EXISTS games (
                    id              INTEGER PRIMARY KEY,
                    name            TEXT NOT NULL,
                    ship_name       TEXT NOT NULL DEFAULT '',
                    momentum        INTEGER NOT NULL DEFAULT 0,
                    threat          INTEGER NOT NULL DEFAULT 0,
                    active_alert    TEXT NOT NULL DEFAULT '',
                    theme           TEXT NOT NULL DEFAULT '',
                    edition         TEXT NOT NULL DEFAULT '2',
                    alt_font        INTEGER NOT NULL DEFAULT 0,
                    legacy_trackers INTEGER NOT NULL DEFAULT 0,
                    ship_model      BLOB,
                    ship_model_meta TEXT
                );"
            }
            Self::Scenes => {
                "CREATE TABLE IF NOT EXISTS scenes (
                    id            INTEGER PRIMARY KEY AUTOINCREMENT,
                    game          INTEGER NOT NULL,
                    name          TEXT NOT NULL,
                    description   TEXT NOT NULL DEFAULT '',
                    mission_track TEXT NOT NULL DEFAULT '[]'
                );"
            }
            Self::Players => {
                "CREATE TABLE IF NOT EXISTS players (
                    id             INTEGER PRIMARY KEY AUTOINCREMENT,
                    game           INTEGER NOT NULL,
                    player_number  INTEGER NOT NULL DEFAULT 0,
                    name           TEXT NOT NULL,
                    current_stress INTEGER NOT NULL DEFAULT 0,
                    max_stress     INTEGER NOT NULL DEFAULT 0,
                    pips           TEXT NOT NULL DEFAULT '',
                    border_color   TEXT NOT NULL DEFAULT '',
                    image          BLOB,
                    image_meta     TEXT
                );"
            }
            Self::Trackers => {
                "CREATE TABLE IF NOT EXISTS trackers (
                    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                    game               INTEGER NOT NULL,
                    name               TEXT NOT NULL,
                    attribute          TEXT NOT NULL,
                    department         TEXT NOT NULL,
                    ship_system        TEXT NOT NULL,
                    ship_department    TEXT NOT NULL,
                    progress_track     INTEGER NOT NULL DEFAULT 0,
                    max_progress_track INTEGER NOT NULL DEFAULT 0,
                    resistance         INTEGER NOT NULL DEFAULT 0,
                    complication_range INTEGER NOT NULL DEFAULT 0,
                    breakthroughs      INTEGER NOT NULL DEFAULT 0
                );"
            }
            Self::Traits => {
                "CREATE TABLE IF NOT EXISTS traits (
                    id    INTEGER PRIMARY KEY AUTOINCREMENT,
                    scene INTEGER NOT NULL,
                    name  TEXT NOT NULL
                );"
            }
            Self::RollTables => {
                "CREATE TABLE IF NOT EXISTS roll_tables (
                    id      INTEGER PRIMARY KEY AUTOINCREMENT,
                    game    INTEGER NOT NULL,
                    name    TEXT NOT NULL,
                    entries TEXT NOT NULL DEFAULT '[]'
                );"
            }
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Open the store at `version`, creating or rebuilding collections as needed.
pub fn initialize(conn: &Connection, version: u32) -> StorageResult<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;

    let stored = stored_version(conn)?;
    if let Some(stored) = stored {
        if stored > version {
            return Err(StorageError::VersionTooNew {
                stored,
                requested: version,
            });
        }
    }

    let tx = conn.unchecked_transaction()?;
    match stored {
        Some(stored) if stored == version => create_collections(&tx)?,
        Some(stored) => {
            warn!("Upgrading store from schema v{stored} to v{version}, dropping all records");
            drop_collections(&tx)?;
            create_collections(&tx)?;
            set_version(&tx, version)?;
        }
        None => {
            debug!("Creating store at schema v{version}");
            create_collections(&tx)?;
            set_version(&tx, version)?;
        }
    }
    tx.commit()?;

    Ok(())
}

/// Schema version recorded in the store, if any.
pub fn stored_version(conn: &Connection) -> rusqlite::Result<Option<u32>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.map(|v| v.parse().unwrap_or(0)))
}

fn set_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [version.to_string()],
    )?;
    Ok(())
}

fn create_collections(conn: &Connection) -> rusqlite::Result<()> {
    for collection in Collection::ALL {
        conn.execute_batch(collection.create_table_sql())?;
        for index in collection.indexes() {
            let table = collection.table();
            let column = index.column();
            conn.execute_batch(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table}({column});"
            ))?;
        }
    }
    Ok(())
}

fn drop_collections(conn: &Connection) -> rusqlite::Result<()> {
    for collection in Collection::ALL {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", collection.table()))?;
    }
    Ok(())
}
