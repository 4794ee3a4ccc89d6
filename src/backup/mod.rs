//! `.staplay` backup archives.
//!
//! An archive is a ZIP container holding `info.json` (every record of one
//! session, as camelCase JSON) and one entry per binary attachment, named by
//! the reference id that replaces the attachment inside `info.json`.
//!
//! ```text
//! session.staplay
//! ├── info.json        {"GameInfo": {..., "shipModel": {"reference": "3f2a…", ...}}, ...}
//! └── 3f2a…            raw ship model bytes
//! ```

mod reference;

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::debug;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{BackupError, BackupResult};
use crate::model::{Entity, GameInfo, PlayerInfo, RollTableInfo, SceneInfo, TrackerInfo};

pub use reference::{AttachmentTable, ReferenceDescriptor};

/// Fixed name of the JSON document inside the container.
pub const INFO_ENTRY: &str = "info.json";

pub const MIME_TYPE: &str = "application/staplay";

pub const FILE_EXTENSION: &str = "staplay";

const GAME_INFO_KEY: &str = "GameInfo";
const PLAYERS_KEY: &str = "Players";
const SCENES_KEY: &str = "Scenes";
const TRACKERS_KEY: &str = "Trackers";
const TRAITS_KEY: &str = "Traits";
const ROLL_TABLES_KEY: &str = "RollTables";

const SHIP_MODEL_FIELD: &str = "shipModel";
const IMAGE_FIELD: &str = "image";

/// A full snapshot of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupData {
    pub game_info: GameInfo,
    pub players: Vec<PlayerInfo>,
    pub scenes: Vec<SceneInfo>,
    pub trackers: Vec<TrackerInfo>,
    /// Trait names keyed by scene id.
    pub traits: BTreeMap<i64, Vec<String>>,
    pub roll_tables: Vec<RollTableInfo>,
}

impl BackupData {
    pub fn new(game_info: GameInfo) -> Self {
        Self {
            game_info,
            players: Vec::new(),
            scenes: Vec::new(),
            trackers: Vec::new(),
            traits: BTreeMap::new(),
            roll_tables: Vec::new(),
        }
    }

    /// Encode the snapshot as a `.staplay` container.
    pub fn to_zip(&self) -> BackupResult<Vec<u8>> {
        let mut table = AttachmentTable::default();
        let document = self.to_document(&mut table)?;
        let info = serde_json::to_vec(&document)?;

        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(INFO_ENTRY, options)?;
        writer.write_all(&info)?;
        for (reference, data) in table.iter() {
            writer.start_file(reference, options)?;
            writer.write_all(data)?;
        }
        let bytes = writer.finish()?.into_inner();

        debug!(
            "Encoded backup of {} with {} attachments ({} bytes)",
            self.game_info.name,
            table.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Decode a `.staplay` container.
    ///
    /// A container without `info.json`, or whose document references an
    /// entry that is not present, is rejected.
    pub fn from_zip(bytes: &[u8]) -> BackupResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let info = read_entry(&mut archive, INFO_ENTRY)?.ok_or(BackupError::MissingInfo)?;
        let document: Value = serde_json::from_slice(&info)
            .map_err(|e| BackupError::MalformedInfo(e.to_string()))?;

        Self::from_document(document, &mut |reference: &str| {
            read_entry(&mut archive, reference)?
                .ok_or_else(|| BackupError::MissingReference(reference.to_string()))
        })
    }

    pub fn write_to(&self, path: &Path) -> BackupResult<()> {
        std::fs::write(path, self.to_zip()?)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> BackupResult<Self> {
        Self::from_zip(&std::fs::read(path)?)
    }

    /// `<game name>.staplay`, with path separators and reserved characters replaced.
    pub fn suggested_file_name(&self) -> String {
        let stem: String = self
            .game_info
            .name
            .trim()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        let stem = if stem.is_empty() { "backup" } else { stem.as_str() };
        format!("{stem}.{FILE_EXTENSION}")
    }

    fn to_document(&self, table: &mut AttachmentTable) -> BackupResult<Value> {
        let mut root = Map::new();

        let game = reference::embed(
            &self.game_info,
            SHIP_MODEL_FIELD,
            self.game_info.ship_model.as_ref(),
            table,
        )?;
        root.insert(GAME_INFO_KEY.to_string(), game);

        let mut players = Vec::with_capacity(self.players.len());
        for player in &self.players {
            players.push(reference::embed(player, IMAGE_FIELD, player.image.as_ref(), table)?);
        }
        root.insert(PLAYERS_KEY.to_string(), Value::Array(players));

        root.insert(SCENES_KEY.to_string(), serde_json::to_value(&self.scenes)?);
        root.insert(TRACKERS_KEY.to_string(), serde_json::to_value(&self.trackers)?);
        root.insert(ROLL_TABLES_KEY.to_string(), serde_json::to_value(&self.roll_tables)?);

        let traits: BTreeMap<String, &Vec<String>> = self
            .traits
            .iter()
            .map(|(scene, names)| (scene.to_string(), names))
            .collect();
        root.insert(TRAITS_KEY.to_string(), serde_json::to_value(traits)?);

        Ok(Value::Object(root))
    }

    fn from_document<F>(document: Value, resolve: &mut F) -> BackupResult<Self>
    where
        F: FnMut(&str) -> BackupResult<Bytes>,
    {
        let Value::Object(mut root) = document else {
            return Err(BackupError::MalformedInfo("document is not an object".to_string()));
        };

        let mut game = root
            .remove(GAME_INFO_KEY)
            .ok_or_else(|| BackupError::MalformedInfo(format!("missing {GAME_INFO_KEY}")))?;
        let ship_model = reference::extract(&mut game, SHIP_MODEL_FIELD, resolve)?;
        let mut game_info = GameInfo::assign(game)?;
        game_info.ship_model = ship_model;

        let mut players = Vec::new();
        for mut value in take_list(&mut root, PLAYERS_KEY)? {
            let image = reference::extract(&mut value, IMAGE_FIELD, resolve)?;
            let mut player = PlayerInfo::assign(value)?;
            player.image = image;
            players.push(player);
        }

        Ok(Self {
            game_info,
            players,
            scenes: assign_all(take_list(&mut root, SCENES_KEY)?)?,
            trackers: assign_all(take_list(&mut root, TRACKERS_KEY)?)?,
            traits: take_traits(&mut root)?,
            roll_tables: assign_all(take_list(&mut root, ROLL_TABLES_KEY)?)?,
        })
    }
}

/// Read one entry. The size declared in the entry header is not trusted for
/// allocation; the buffer grows with the bytes actually stored.
fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> BackupResult<Option<Bytes>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(Some(Bytes::from(data)))
}

/// Missing and null lists read as empty.
fn take_list(root: &mut Map<String, Value>, key: &str) -> BackupResult<Vec<Value>> {
    match root.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(BackupError::MalformedInfo(format!("{key} is not a list"))),
    }
}

fn assign_all<T: Entity>(values: Vec<Value>) -> BackupResult<Vec<T>> {
    values
        .into_iter()
        .map(|value| T::assign(value).map_err(BackupError::from))
        .collect()
}

fn take_traits(root: &mut Map<String, Value>) -> BackupResult<BTreeMap<i64, Vec<String>>> {
    let Some(value) = root.remove(TRAITS_KEY).filter(|v| !v.is_null()) else {
        return Ok(BTreeMap::new());
    };
    let raw: BTreeMap<String, Vec<String>> = serde_json::from_value(value)
        .map_err(|e| BackupError::MalformedInfo(format!("{TRAITS_KEY}: {e}")))?;

    raw.into_iter()
        .map(|(scene, names)| match scene.trim().parse::<i64>() {
            Ok(id) => Ok((id, names)),
            Err(_) => Err(BackupError::MalformedInfo(format!(
                "{TRAITS_KEY} key {scene:?} is not a scene id"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{Attachment, RollTableEntry};

    fn voyage_home() -> BackupData {
        let mut game = GameInfo::new("Voyage Home").unwrap();
        game.id = Some(1);
        game.ship_name = "HMS Bounty".to_string();
        game.momentum = 3;
        game.active_alert = "yellow".to_string();
        game.ship_model = Some(Attachment::new("bounty.glb", "model/gltf-binary", vec![7u8; 512]));

        let mut kirk = PlayerInfo::new(1, 0, "Kirk").unwrap();
        kirk.id = Some(1);
        kirk.image = Some(Attachment::new("kirk.png", "image/png", vec![1u8, 2, 3]));
        let mut spock = PlayerInfo::new(1, 1, "Spock").unwrap();
        spock.id = Some(2);

        let mut scene = SceneInfo::new(1, "San Francisco, 1986").unwrap();
        scene.id = Some(4);

        let mut tracker = TrackerInfo::new(1, "Find the whales").unwrap().with_progress(12, None);
        tracker.id = Some(9);

        let table = RollTableInfo::new(
            1,
            "Locals",
            vec![
                RollTableEntry::new(1, 3, "Punk on the bus"),
                RollTableEntry::new(4, 6, "Dr. Taylor"),
            ],
        )
        .unwrap();

        let mut data = BackupData::new(game);
        data.players = vec![kirk, spock];
        data.scenes = vec![scene];
        data.trackers = vec![tracker];
        data.traits.insert(4, vec!["Primitive".to_string(), "Crowded".to_string()]);
        data.roll_tables = vec![table];
        data
    }

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn roundtrip_preserves_everything() {
        let data = voyage_home();
        let restored = BackupData::from_zip(&data.to_zip().unwrap()).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn absent_attachments_stay_absent() {
        let mut data = voyage_home();
        data.game_info.ship_model = None;
        data.players[0].image = None;

        let bytes = data.to_zip().unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        assert_eq!(archive.len(), 1);

        let restored = BackupData::from_zip(&bytes).unwrap();
        assert!(restored.game_info.ship_model.is_none());
        assert!(restored.players.iter().all(|p| p.image.is_none()));
    }

    #[test]
    fn attachments_are_stored_beside_info() {
        let data = voyage_home();
        let bytes = data.to_zip().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        assert_eq!(archive.len(), 3);

        let info = read_entry(&mut archive, INFO_ENTRY).unwrap().unwrap();
        let document: Value = serde_json::from_slice(&info).unwrap();
        let reference = document["GameInfo"]["shipModel"]["reference"].as_str().unwrap();
        let payload = read_entry(&mut archive, reference).unwrap().unwrap();
        assert_eq!(payload.len(), 512);
        assert_eq!(document["GameInfo"]["shipModel"]["size"], 512);
        assert_eq!(document["Traits"]["4"][0], "Primitive");
    }

    #[test]
    fn missing_info_is_fatal() {
        let bytes = zip_with(&[("readme.txt", b"hello")]);
        let err = BackupData::from_zip(&bytes).unwrap_err();
        assert!(matches!(err, BackupError::MissingInfo));
    }

    #[test]
    fn missing_reference_is_fatal() {
        let info = json!({
            "GameInfo": {
                "name": "Voyage Home",
                "shipModel": {
                    "name": "bounty.glb",
                    "size": 3,
                    "type": "model/gltf-binary",
                    "lastModified": 10,
                    "isReferencedFile": true,
                    "reference": "not-in-archive",
                }
            }
        });
        let bytes = zip_with(&[(INFO_ENTRY, info.to_string().as_bytes())]);
        let err = BackupData::from_zip(&bytes).unwrap_err();
        assert!(matches!(err, BackupError::MissingReference(r) if r == "not-in-archive"));
    }

    fn crc32(data: &[u8]) -> u32 {
        let mut crc = !0u32;
        for &byte in data {
            crc ^= u32::from(byte);
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
            }
        }
        !crc
    }

    /// One stored entry whose zip64 extra field declares `declared_size`
    /// uncompressed bytes, regardless of what is actually stored.
    fn zip64_entry(name: &str, data: &[u8], declared_size: u64) -> Vec<u8> {
        let mut extra = Vec::new();
        extra.extend_from_slice(&1u16.to_le_bytes());
        extra.extend_from_slice(&16u16.to_le_bytes());
        extra.extend_from_slice(&declared_size.to_le_bytes());
        extra.extend_from_slice(&(data.len() as u64).to_le_bytes());

        let crc = crc32(data);
        let name_len = name.len() as u16;
        let extra_len = extra.len() as u16;
        let mut out = Vec::new();

        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        for field in [45u16, 0, 0, 0, 0x21] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&name_len.to_le_bytes());
        out.extend_from_slice(&extra_len.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&extra);
        out.extend_from_slice(data);

        let central_offset = out.len() as u32;
        out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        for field in [45u16, 45, 0, 0, 0, 0x21] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        for field in [name_len, extra_len, 0, 0, 0] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&extra);
        let central_size = out.len() as u32 - central_offset;

        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        for field in [0u16, 0, 1, 1] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        out.extend_from_slice(&central_size.to_le_bytes());
        out.extend_from_slice(&central_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    #[test]
    fn zip64_entry_with_true_size_decodes() {
        let info = br#"{"GameInfo":{"name":"Voyage Home"}}"#;
        let bytes = zip64_entry(INFO_ENTRY, info, info.len() as u64);
        let data = BackupData::from_zip(&bytes).unwrap();
        assert_eq!(data.game_info.name, "Voyage Home");
    }

    #[test]
    fn inflated_declared_size_does_not_allocate() {
        let info = br#"{"GameInfo":{"name":"Voyage Home"}}"#;
        let bytes = zip64_entry(INFO_ENTRY, info, 1 << 60);

        match BackupData::from_zip(&bytes) {
            Ok(data) => assert_eq!(data.game_info.name, "Voyage Home"),
            Err(e) => assert!(matches!(e, BackupError::Zip(_) | BackupError::Io(_)), "{e}"),
        }
    }

    #[test]
    fn corrupt_container_is_rejected() {
        let err = BackupData::from_zip(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, BackupError::Zip(_)));
    }

    #[test]
    fn malformed_info_is_rejected() {
        let bytes = zip_with(&[(INFO_ENTRY, b"{ nope")]);
        assert!(matches!(
            BackupData::from_zip(&bytes).unwrap_err(),
            BackupError::MalformedInfo(_)
        ));

        let bytes = zip_with(&[(INFO_ENTRY, b"{\"Players\": []}")]);
        assert!(matches!(
            BackupData::from_zip(&bytes).unwrap_err(),
            BackupError::MalformedInfo(_)
        ));
    }

    #[test]
    fn empty_game_name_is_invalid_record() {
        let bytes = zip_with(&[(INFO_ENTRY, b"{\"GameInfo\": {\"name\": \"\"}}")]);
        assert!(matches!(
            BackupData::from_zip(&bytes).unwrap_err(),
            BackupError::InvalidRecord(_)
        ));
    }

    #[test]
    fn older_archives_without_roll_tables() {
        let info = json!({
            "GameInfo": { "id": 1, "name": "Voyage Home", "momentum": "2" },
            "Players": [{ "id": 1, "game": 1, "name": "Kirk", "playerNumber": 0 }],
            "Scenes": [],
            "Trackers": [{ "game": 1, "name": "Whales", "progressTrack": 6 }],
            "Traits": { "3": ["Fog"] },
        });
        let bytes = zip_with(&[(INFO_ENTRY, info.to_string().as_bytes())]);
        let data = BackupData::from_zip(&bytes).unwrap();

        assert_eq!(data.game_info.momentum, 2);
        assert!(data.roll_tables.is_empty());
        assert_eq!(data.trackers[0].max_progress_track, 6);
        assert_eq!(data.traits[&3], vec!["Fog".to_string()]);
    }

    #[test]
    fn non_numeric_trait_key_is_rejected() {
        let info = json!({ "GameInfo": { "name": "g" }, "Traits": { "bridge": ["Dark"] } });
        let bytes = zip_with(&[(INFO_ENTRY, info.to_string().as_bytes())]);
        assert!(matches!(
            BackupData::from_zip(&bytes).unwrap_err(),
            BackupError::MalformedInfo(_)
        ));
    }

    #[test]
    fn write_and_read_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let data = voyage_home();
        let path = temp_dir.path().join(data.suggested_file_name());

        data.write_to(&path).unwrap();
        assert_eq!(BackupData::read_from(&path).unwrap(), data);
    }

    #[test]
    fn suggested_file_name_is_safe() {
        let mut data = voyage_home();
        assert_eq!(data.suggested_file_name(), "Voyage Home.staplay");
        data.game_info.name = "A/B: C?".to_string();
        assert_eq!(data.suggested_file_name(), "A_B_ C_.staplay");
    }
}
