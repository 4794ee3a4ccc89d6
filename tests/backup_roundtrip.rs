//! End-to-end: populate a store, export it, wipe it, and restore the archive.

use staplay::backup::BackupData;
use staplay::config::StoreConfig;
use staplay::model::{
    Attachment, Edition, GameInfo, PlayerInfo, RollTableEntry, RollTableInfo, SceneInfo,
    TrackerInfo,
};
use staplay::storage::{Collection, GAME_KEY};
use staplay::store::{SaveOutcome, SessionStore};
use tempfile::TempDir;

fn populate(store: &SessionStore) -> Vec<u8> {
    let mut game = GameInfo::new("Voyage Home").unwrap();
    game.ship_name = "HMS Bounty".to_string();
    game.momentum = 4;
    game.threat = 2;
    game.active_alert = "red".to_string();
    game.set_edition("1");
    assert_eq!(store.save_game_info(&game, None).unwrap(), SaveOutcome::Saved);

    let portrait = vec![0xffu8, 0xd8, 0xff, 0xe0, 0, 16];
    let mut kirk = PlayerInfo::new(GAME_KEY, 0, "Kirk").unwrap();
    kirk.max_stress = 12;
    kirk.image = Some(Attachment::new("kirk.jpg", "image/jpeg", portrait));
    let spock = PlayerInfo::new(GAME_KEY, 1, "Spock").unwrap();
    store.replace_players(GAME_KEY, &[kirk, spock], None).unwrap();

    let tracker = TrackerInfo::new(GAME_KEY, "Bring back the whales")
        .unwrap()
        .with_progress(10, None);
    store.replace_trackers(GAME_KEY, &[tracker], None).unwrap();

    let table = RollTableInfo::new(
        GAME_KEY,
        "1986 encounters",
        vec![
            RollTableEntry::new(1, 10, "Punk with a boombox"),
            RollTableEntry::new(11, 20, "Nuclear wessels"),
        ],
    )
    .unwrap();
    store.replace_roll_tables(GAME_KEY, &[table], None).unwrap();

    let scene_id = store
        .save_scene(&SceneInfo::new(GAME_KEY, "Cetacean Institute").unwrap(), None)
        .unwrap()
        .unwrap();
    store
        .replace_traits(scene_id, &["Crowded".to_string(), "Tourists".to_string()], None)
        .unwrap();

    store.export("Voyage Home", None).unwrap()
}

#[test]
fn export_clear_import_restores_session() {
    let temp_dir = TempDir::new().unwrap();
    let store = SessionStore::new(StoreConfig::new(temp_dir.path(), "staplay"));

    let archive = populate(&store);
    let before = store.snapshot("Voyage Home", None).unwrap();

    store.clear().unwrap();
    assert!(store.get_game_info(None, None).unwrap().is_none());

    let backup = BackupData::from_zip(&archive).unwrap();
    store.import(&backup, None).unwrap();

    let after = store.snapshot("Voyage Home", None).unwrap();
    assert_eq!(after, before);

    let game = after.game_info;
    assert_eq!(game.edition(), Some(Edition::First));
    assert_eq!(game.active_alert, "red");

    assert_eq!(after.players.len(), 2);
    let image = after.players[0].image.as_ref().unwrap();
    assert_eq!(image.name, "kirk.jpg");
    assert_eq!(image.mime_type, "image/jpeg");
    assert_eq!(&image.data[..], &[0xffu8, 0xd8, 0xff, 0xe0, 0, 16]);
    assert!(after.players[1].image.is_none());

    assert_eq!(after.trackers[0].max_progress_track, 10);
    let traits = after.traits.values().next().unwrap();
    assert_eq!(traits, &vec!["Crowded".to_string(), "Tourists".to_string()]);
}

#[test]
fn archive_file_imports_into_fresh_store() {
    let temp_dir = TempDir::new().unwrap();
    let source = SessionStore::new(StoreConfig::new(temp_dir.path().join("a"), "staplay"));
    let target = SessionStore::new(StoreConfig::new(temp_dir.path().join("b"), "staplay"));
    populate(&source);

    let path = temp_dir.path().join("voyage.staplay");
    source.export_to_file("Voyage Home", &path, None).unwrap();
    let summary = target.import_file(&path, None).unwrap();

    assert_eq!(summary.players, 2);
    assert_eq!(summary.traits, 2);
    assert_eq!(target.count(Collection::Trackers, None).unwrap(), 1);
    assert_eq!(
        target.snapshot("Voyage Home", None).unwrap(),
        source.snapshot("Voyage Home", None).unwrap()
    );
}

#[test]
fn corrupt_archive_leaves_store_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let store = SessionStore::new(StoreConfig::new(temp_dir.path(), "staplay"));
    populate(&store);

    let path = temp_dir.path().join("broken.staplay");
    std::fs::write(&path, b"PK not really").unwrap();

    assert!(store.import_file(&path, None).is_err());
    assert_eq!(store.get_players(GAME_KEY, None).unwrap().len(), 2);
}
