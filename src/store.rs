//! Session store façade.
//!
//! [`SessionStore`] is the only type the rest of an application needs: it
//! knows where the database lives, opens handles, and exposes one method per
//! read or write the UI performs. Every method takes an optional handle. With
//! `Some(db)` the call runs on the caller's handle, so several calls can be
//! grouped under one [`Database::transaction`]. With `None` the store opens a
//! handle for the call and releases it on every exit path.

use tracing::{debug, info, warn};

use crate::backup::BackupData;
use crate::config::StoreConfig;
use crate::error::{StorageError, StorageResult};
use crate::model::{Entity, GameInfo, PlayerInfo, RollTableInfo, SceneInfo, TrackerInfo, TraitInfo};
use crate::storage::{self, Collection, Database, Index, Record, GAME_KEY};

/// Result of a single-record save that is gated on validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The record failed validation and nothing was written.
    Rejected,
}

/// Result of replacing a validated collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceReport<T> {
    pub inserted: usize,
    /// Records dropped because they failed validation.
    pub rejected: Vec<T>,
}

/// Row counts written by [`SessionStore::import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub scenes: usize,
    pub players: usize,
    pub trackers: usize,
    pub traits: usize,
    pub roll_tables: usize,
    pub rejected: usize,
}

pub struct SessionStore {
    config: StoreConfig,
}

impl SessionStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open a handle, creating or upgrading the store as needed.
    pub fn open(&self) -> StorageResult<Database> {
        Database::open(&self.config.database_path(), self.config.version)
    }

    pub fn close(&self, db: Database) -> StorageResult<()> {
        db.close()
    }

    /// Destroy the whole backing store. Irreversible.
    pub fn clear(&self) -> StorageResult<()> {
        let path = self.config.database_path();
        storage::destroy(&path)?;
        info!("Cleared session store at {}", path.display());
        Ok(())
    }

    pub fn count(&self, collection: Collection, handle: Option<&Database>) -> StorageResult<i64> {
        self.with_handle(handle, |db| db.count(collection))
    }

    fn with_handle<T>(
        &self,
        handle: Option<&Database>,
        f: impl FnOnce(&Database) -> StorageResult<T>,
    ) -> StorageResult<T> {
        if let Some(db) = handle {
            return f(db);
        }
        let db = self.open()?;
        let value = f(&db)?;
        db.close()?;
        Ok(value)
    }

    // -- Reads --

    /// Fetch the game by name, or the single stored game when `name` is `None`.
    pub fn get_game_info(
        &self,
        name: Option<&str>,
        handle: Option<&Database>,
    ) -> StorageResult<Option<GameInfo>> {
        self.with_handle(handle, |db| match name {
            Some(name) => Ok(db
                .get_all_by_index::<GameInfo>(Index::Name, name)?
                .into_iter()
                .next()),
            None => db.get(GAME_KEY),
        })
    }

    /// Scenes of a game in insertion order.
    pub fn get_scenes(
        &self,
        game_id: i64,
        handle: Option<&Database>,
    ) -> StorageResult<Vec<SceneInfo>> {
        self.with_handle(handle, |db| db.get_all_by_index(Index::Game, game_id))
    }

    /// Players of a game ordered by player number.
    pub fn get_players(
        &self,
        game_id: i64,
        handle: Option<&Database>,
    ) -> StorageResult<Vec<PlayerInfo>> {
        self.with_handle(handle, |db| db.get_all_by_index(Index::Game, game_id))
    }

    pub fn get_trackers(
        &self,
        game_id: i64,
        handle: Option<&Database>,
    ) -> StorageResult<Vec<TrackerInfo>> {
        self.with_handle(handle, |db| db.get_all_by_index(Index::Game, game_id))
    }

    pub fn get_roll_tables(
        &self,
        game_id: i64,
        handle: Option<&Database>,
    ) -> StorageResult<Vec<RollTableInfo>> {
        self.with_handle(handle, |db| db.get_all_by_index(Index::Game, game_id))
    }

    /// Trait names of a scene.
    pub fn get_traits(
        &self,
        scene_id: i64,
        handle: Option<&Database>,
    ) -> StorageResult<Vec<String>> {
        self.with_handle(handle, |db| {
            let traits: Vec<TraitInfo> = db.get_all_by_index(Index::Scene, scene_id)?;
            Ok(traits.into_iter().map(|t| t.name).collect())
        })
    }

    // -- Writes --

    /// Store `info` as the single game row.
    ///
    /// An invalid record is logged and not written.
    pub fn save_game_info(
        &self,
        info: &GameInfo,
        handle: Option<&Database>,
    ) -> StorageResult<SaveOutcome> {
        if !info.validate() {
            warn!("Game {:?} failed validation, not saved", info.name);
            return Ok(SaveOutcome::Rejected);
        }
        let mut row = info.clone();
        row.id = Some(GAME_KEY);
        self.with_handle(handle, |db| db.put(&row))?;
        Ok(SaveOutcome::Saved)
    }

    /// Insert or update a scene. Returns its id, or `None` if it was rejected.
    pub fn save_scene(
        &self,
        scene: &SceneInfo,
        handle: Option<&Database>,
    ) -> StorageResult<Option<i64>> {
        if !scene.validate() {
            warn!("Scene {:?} failed validation, not saved", scene.name);
            return Ok(None);
        }
        self.with_handle(handle, |db| db.put(scene)).map(Some)
    }

    /// Delete a scene together with its traits.
    pub fn delete_scene(&self, scene_id: i64, handle: Option<&Database>) -> StorageResult<bool> {
        self.with_handle(handle, |db| {
            db.transaction(|db| {
                db.delete_by_index(Collection::Traits, Index::Scene, scene_id)?;
                db.delete(Collection::Scenes, scene_id)
            })
        })
    }

    /// Replace every trait of a scene. Empty names are skipped.
    pub fn replace_traits(
        &self,
        scene_id: i64,
        names: &[String],
        handle: Option<&Database>,
    ) -> StorageResult<usize> {
        let traits: Vec<TraitInfo> = names
            .iter()
            .filter_map(|name| match TraitInfo::new(scene_id, name.as_str()) {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!("Skipping trait of scene {scene_id}: {e}");
                    None
                }
            })
            .collect();
        self.with_handle(handle, |db| replace_scoped(db, Index::Scene, scene_id, traits))
    }

    /// Replace every player of a game.
    pub fn replace_players(
        &self,
        game_id: i64,
        players: &[PlayerInfo],
        handle: Option<&Database>,
    ) -> StorageResult<usize> {
        let players: Vec<PlayerInfo> = players
            .iter()
            .cloned()
            .map(|mut p| {
                p.game = game_id;
                p
            })
            .collect();
        self.with_handle(handle, |db| replace_scoped(db, Index::Game, game_id, players))
    }

    /// Replace every tracker of a game, dropping trackers that fail validation.
    pub fn replace_trackers(
        &self,
        game_id: i64,
        trackers: &[TrackerInfo],
        handle: Option<&Database>,
    ) -> StorageResult<ReplaceReport<TrackerInfo>> {
        let (valid, rejected) = partition_valid(trackers, |t| t.game = game_id);
        let inserted =
            self.with_handle(handle, |db| replace_scoped(db, Index::Game, game_id, valid))?;
        Ok(ReplaceReport { inserted, rejected })
    }

    /// Replace every roll table of a game, dropping tables that fail validation.
    pub fn replace_roll_tables(
        &self,
        game_id: i64,
        tables: &[RollTableInfo],
        handle: Option<&Database>,
    ) -> StorageResult<ReplaceReport<RollTableInfo>> {
        let (valid, rejected) = partition_valid(tables, |t| t.game = game_id);
        let inserted =
            self.with_handle(handle, |db| replace_scoped(db, Index::Game, game_id, valid))?;
        Ok(ReplaceReport { inserted, rejected })
    }

    // -- Backup --

    /// Collect everything stored for the named game.
    pub fn snapshot(
        &self,
        game_name: &str,
        handle: Option<&Database>,
    ) -> StorageResult<BackupData> {
        self.with_handle(handle, |db| {
            let game = self
                .get_game_info(Some(game_name), Some(db))?
                .ok_or_else(|| StorageError::GameNotFound(game_name.to_string()))?;
            let game_id = game.id.unwrap_or(GAME_KEY);

            let mut data = BackupData::new(game);
            data.scenes = self.get_scenes(game_id, Some(db))?;
            for scene_id in data.scenes.iter().filter_map(|s| s.id) {
                data.traits.insert(scene_id, self.get_traits(scene_id, Some(db))?);
            }
            data.players = self.get_players(game_id, Some(db))?;
            data.trackers = self.get_trackers(game_id, Some(db))?;
            data.roll_tables = self.get_roll_tables(game_id, Some(db))?;
            Ok(data)
        })
    }

    /// Encode the named game as a `.staplay` archive.
    pub fn export(&self, game_name: &str, handle: Option<&Database>) -> StorageResult<Vec<u8>> {
        let data = self.snapshot(game_name, handle)?;
        let bytes = data.to_zip()?;
        info!(
            "Exported {:?}: {} scenes, {} players, {} trackers, {} roll tables",
            data.game_info.name,
            data.scenes.len(),
            data.players.len(),
            data.trackers.len(),
            data.roll_tables.len()
        );
        Ok(bytes)
    }

    /// Export to `path`, returning the snapshot that was written.
    pub fn export_to_file(
        &self,
        game_name: &str,
        path: &std::path::Path,
        handle: Option<&Database>,
    ) -> StorageResult<BackupData> {
        let data = self.snapshot(game_name, handle)?;
        data.write_to(path)?;
        info!("Exported {:?} to {}", data.game_info.name, path.display());
        Ok(data)
    }

    /// Replace the stored session with `backup`.
    ///
    /// Runs in one transaction. Record ids are preserved so traits stay
    /// attached to their scenes; every child is re-parented to the single
    /// stored game.
    pub fn import(
        &self,
        backup: &BackupData,
        handle: Option<&Database>,
    ) -> StorageResult<ImportSummary> {
        let summary = self.with_handle(handle, |db| {
            db.transaction(|db| {
                for collection in Collection::ALL {
                    db.clear_collection(collection)?;
                }

                let mut summary = ImportSummary::default();
                if self.save_game_info(&backup.game_info, Some(db))? == SaveOutcome::Rejected {
                    summary.rejected += 1;
                }

                let (scenes, rejected) = partition_valid(&backup.scenes, |s| s.game = GAME_KEY);
                summary.rejected += rejected.len();
                summary.scenes = insert_all(db, scenes)?;

                let (players, rejected) = partition_valid(&backup.players, |p| p.game = GAME_KEY);
                summary.rejected += rejected.len();
                summary.players = insert_all(db, players)?;

                let (trackers, rejected) =
                    partition_valid(&backup.trackers, |t| t.game = GAME_KEY);
                summary.rejected += rejected.len();
                summary.trackers = insert_all(db, trackers)?;

                let (tables, rejected) =
                    partition_valid(&backup.roll_tables, |t| t.game = GAME_KEY);
                summary.rejected += rejected.len();
                summary.roll_tables = insert_all(db, tables)?;

                for (scene_id, names) in &backup.traits {
                    for name in names {
                        match TraitInfo::new(*scene_id, name.as_str()) {
                            Ok(t) => {
                                db.put(&t)?;
                                summary.traits += 1;
                            }
                            Err(e) => {
                                warn!("Skipping trait of scene {scene_id}: {e}");
                                summary.rejected += 1;
                            }
                        }
                    }
                }
                Ok(summary)
            })
        })?;

        info!(
            "Imported {:?}: {} scenes, {} players, {} trackers, {} traits, {} roll tables \
             ({} rejected)",
            backup.game_info.name,
            summary.scenes,
            summary.players,
            summary.trackers,
            summary.traits,
            summary.roll_tables,
            summary.rejected
        );
        Ok(summary)
    }

    pub fn import_file(
        &self,
        path: &std::path::Path,
        handle: Option<&Database>,
    ) -> StorageResult<ImportSummary> {
        let backup = BackupData::read_from(path)?;
        self.import(&backup, handle)
    }
}

/// Delete every row of `R` whose `index` equals `scope`, then insert `records`.
fn replace_scoped<R: Record>(
    db: &Database,
    index: Index,
    scope: i64,
    records: Vec<R>,
) -> StorageResult<usize> {
    db.transaction(|db| {
        let removed = db.delete_by_index(R::COLLECTION, index, scope)?;
        let inserted = insert_all(db, records)?;
        debug!(
            "Replaced {removed} rows of {} for {} {scope} with {inserted}",
            R::COLLECTION,
            index.column()
        );
        Ok(inserted)
    })
}

/// Insert `records` without overwriting existing rows.
///
/// A record whose id is already taken by a row outside the replaced scope
/// gets a fresh id instead.
fn insert_all<R: Record>(db: &Database, records: Vec<R>) -> StorageResult<usize> {
    let count = records.len();
    for mut record in records {
        if let Some(id) = record.id() {
            if db.contains(R::COLLECTION, id)? {
                warn!("{} id {id} belongs to another record; assigning a new id", R::KIND);
                record.set_id(None);
            }
        }
        db.add(&record)?;
    }
    Ok(count)
}

/// Re-parent copies of `records` and split them by [`Entity::validate`].
fn partition_valid<T: Entity + Clone>(
    records: &[T],
    reparent: impl Fn(&mut T),
) -> (Vec<T>, Vec<T>) {
    let (valid, rejected): (Vec<T>, Vec<T>) = records
        .iter()
        .cloned()
        .map(|mut r| {
            reparent(&mut r);
            r
        })
        .partition(|r| r.validate());
    for record in &rejected {
        warn!("Dropping {} {:?}: failed validation", T::KIND, record.name());
    }
    (valid, rejected)
}
