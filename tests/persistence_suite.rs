use std::{fs, path::Path};

use bankviz::{
    errors::PersistenceError,
    storage::{FileSlot, Format, FormatRegistry, Vid},
    utils::fs::tmp_path,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Notes {
    title: String,
    lines: Vec<String>,
}

fn notes() -> Notes {
    Notes {
        title: "groceries".into(),
        lines: vec!["milk".into(), "bread".into()],
    }
}

fn registry(major: u32, minor: u32, patch: u32) -> FormatRegistry {
    FormatRegistry::new().with(Format::serde::<Notes>("notes", Vid::new(major, minor, patch)))
}

fn write_envelope(path: &Path, format: &str, version: &str) {
    let envelope = json!({
        "format": format,
        "version": version,
        "content": {"title": "old", "lines": []}
    });
    fs::write(path, serde_json::to_string(&envelope).unwrap()).unwrap();
}

#[test]
fn round_trip_leaves_slot_clean() {
    let dir = tempdir().unwrap();
    let registry = registry(1, 0, 0);
    let path = dir.path().join("notes.json");

    let mut slot = FileSlot::new(&path, Some("notes"), notes());
    assert!(slot.is_dirty());
    assert!(slot.save(&registry));
    assert!(!slot.is_dirty());

    let loaded = FileSlot::<Notes>::from_file(&registry, &path, Some("notes")).expect("load");
    assert_eq!(loaded.content(), &notes());
    assert!(!loaded.is_dirty());
    assert_eq!(loaded.format_id(), Some("notes"));
}

#[test]
fn envelope_on_disk_carries_format_and_version() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.json");
    assert!(registry(2, 3, 4).save(&path, "notes", &notes()));
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["format"], "notes");
    assert_eq!(raw["version"], "2.3.4");
    assert_eq!(raw["content"]["lines"][1], "bread");
}

#[test]
fn newer_stored_minor_is_incompatible() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.json");
    write_envelope(&path, "notes", "1.2.0");
    let err = registry(1, 1, 0).try_load::<Notes>(&path, None).unwrap_err();
    assert!(matches!(err, PersistenceError::IncompatibleVersion { .. }));
    assert!(err.to_string().contains("load upgrade impossible"));
}

#[test]
fn older_patch_loads_and_marks_upgrade_pending() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.json");
    write_envelope(&path, "notes", "0.1.0");
    let registry = registry(0, 1, 5);
    let slot = FileSlot::<Notes>::from_file(&registry, &path, Some("notes")).expect("load");
    assert!(slot.is_dirty());
    assert_eq!(slot.content().title, "old");
}

#[test]
fn major_mismatch_fails_both_ways() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.json");
    write_envelope(&path, "notes", "1.0.0");
    assert!(registry(2, 0, 0).load::<Notes>(&path, None).is_none());
    write_envelope(&path, "notes", "3.0.0");
    assert!(registry(2, 0, 0).load::<Notes>(&path, None).is_none());
}

#[test]
fn wrong_format_is_a_protocol_mismatch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.json");
    write_envelope(&path, "notes", "1.0.0");
    let err = registry(1, 0, 0)
        .try_load::<Notes>(&path, Some("ledger"))
        .unwrap_err();
    assert!(matches!(err, PersistenceError::ProtocolMismatch { .. }));
}

#[test]
fn failed_slot_load_keeps_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.json");
    write_envelope(&path, "notes", "9.0.0");
    let mut slot = FileSlot::new(&path, Some("notes"), notes());
    assert!(slot.load(&registry(1, 0, 0)).is_none());
    assert_eq!(slot.content(), &notes());
    assert!(slot.is_dirty());
}

#[test]
fn atomic_save_failure_preserves_original_file() {
    let dir = tempdir().unwrap();
    let registry = registry(1, 0, 0);
    let path = dir.path().join("notes.json");
    let mut slot = FileSlot::new(&path, Some("notes"), notes());
    slot.try_save(&registry).expect("initial save");
    let original = fs::read_to_string(&path).unwrap();

    // A directory squatting on the staging path makes the write fail before the rename.
    fs::create_dir_all(tmp_path(&path)).unwrap();
    slot.content_mut().lines.push("eggs".into());
    assert!(slot.try_save(&registry).is_err());
    assert!(slot.is_dirty());
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}
