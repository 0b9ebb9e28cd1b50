//! Integration tests for library persistence: the JSON file must
//! round-trip every field losslessly and omit absent values.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use gameshelf::library::{GameEntry, GameLibrary};

fn full_entry() -> GameEntry {
    GameEntry {
        added: Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap(),
        shortcut: Some(PathBuf::from("/games/DOOM (1993).lnk")),
        completed: Some(Utc.with_ymd_and_hms(2022, 1, 2, 20, 30, 0).unwrap()),
        played: vec![
            Utc.with_ymd_and_hms(2021, 6, 2, 18, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2021, 12, 24, 23, 0, 0).unwrap(),
        ],
        image_path: Some(PathBuf::from("/covers/igdb/DOOM (1993).png")),
        summary: Some("Rip and tear.".to_string()),
        rating: Some(92),
        developer: Some("id Software".to_string()),
        genres: vec!["Shooter".to_string(), "Arcade".to_string()],
        extensions: BTreeMap::from([("igdb".to_string(), "7351".to_string())]),
    }
}

fn minimal_entry() -> GameEntry {
    GameEntry::discovered(
        PathBuf::from("/games/Myst.lnk"),
        Utc.with_ymd_and_hms(2020, 3, 3, 9, 0, 0).unwrap(),
    )
}

#[test]
fn every_field_round_trips_through_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.json");

    let games = HashMap::from([
        ("DOOM (1993)".to_string(), full_entry()),
        ("Myst".to_string(), minimal_entry()),
    ]);
    std::fs::write(&path, serde_json::to_string(&games).unwrap()).unwrap();

    let library = GameLibrary::load(&path).unwrap();
    assert_eq!(library.len(), 2);
    assert_eq!(library.get("DOOM (1993)").unwrap(), full_entry());
    assert_eq!(library.get("Myst").unwrap(), minimal_entry());
}

#[test]
fn absent_fields_are_omitted_from_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.json");
    let library = GameLibrary::load(&path).unwrap();
    library.insert_discovered("Myst", "/games/Myst.lnk".into(), Utc::now());
    library.save().unwrap();

    let json = std::fs::read_to_string(&path).unwrap();
    assert!(json.contains("\"added\""));
    assert!(json.contains("\"shortcut\""));
    assert!(!json.contains("\"summary\""));
    assert!(!json.contains("\"rating\""));
    assert!(!json.contains("\"played\""));
    assert!(!json.contains("\"genres\""));
    assert!(!json.contains("\"extensions\""));
    assert!(!json.contains("\"imagePath\""));
}

#[test]
fn wire_field_names_are_camel_case() {
    let mut entry = minimal_entry();
    entry.image_path = Some(PathBuf::from("/covers/Myst.jpg"));
    let json = serde_json::to_string(&entry).unwrap();
    assert!(json.contains("\"imagePath\""));
    assert!(!json.contains("\"image_path\""));
}

#[test]
fn empty_and_populated_genre_lists_both_survive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.json");

    let mut with_genres = minimal_entry();
    with_genres.genres = vec!["Puzzle".to_string()];
    let games = HashMap::from([
        ("A".to_string(), minimal_entry()),
        ("B".to_string(), with_genres),
    ]);
    std::fs::write(&path, serde_json::to_string(&games).unwrap()).unwrap();

    let library = GameLibrary::load(&path).unwrap();
    assert!(library.get("A").unwrap().genres.is_empty());
    assert_eq!(library.get("B").unwrap().genres, vec!["Puzzle"]);
}

#[test]
fn mutations_survive_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.json");

    {
        let library = GameLibrary::load(&path).unwrap();
        library.insert_discovered("Doom", "/games/Doom.lnk".into(), Utc::now());
        library.insert_discovered("Quake", "/games/Quake.lnk".into(), Utc::now());
        library.save().unwrap();

        assert!(library.record_play("Doom").unwrap());
        assert!(library.mark_completed("Doom").unwrap());
        assert!(library.unlink_shortcut("Quake").unwrap());
        assert!(library.rename("Doom", "DOOM (1993)").unwrap());
    }

    let library = GameLibrary::load(&path).unwrap();
    let doom = library.get("DOOM (1993)").unwrap();
    assert_eq!(doom.played.len(), 1);
    assert!(doom.completed.is_some());
    assert!(library.get("Doom").is_none());
    assert!(library.get("Quake").unwrap().removed());
}

#[test]
fn remove_deletes_the_entry_for_good() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.json");

    let library = GameLibrary::load(&path).unwrap();
    library.insert_discovered("Doom", "/games/Doom.lnk".into(), Utc::now());
    library.save().unwrap();
    assert!(library.remove("Doom").unwrap());
    assert!(!library.remove("Doom").unwrap());

    let reloaded = GameLibrary::load(&path).unwrap();
    assert!(reloaded.is_empty());
}
