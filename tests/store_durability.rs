use std::fs;

use chrono::NaiveDate;
use tempfile::tempdir;

use kita_absence_tracker::bridge::{Backend, Client, NoDialog};
use kita_absence_tracker::db::{self, Store, DB_FILE_NAME};
use kita_absence_tracker::models::{MonthKey, NewAbsence, NewChild};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn reopening_reproduces_flushed_data() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(DB_FILE_NAME);

    {
        let store = Store::open(&path).unwrap();
        let mut client = Client::new(Backend::new(store, Box::new(NoDialog)));
        let id = client
            .add_child(NewChild {
                name: "Anna".to_string(),
                group: Some("Bears".to_string()),
                birth_date: Some(date(2020, 1, 1)),
            })
            .unwrap();
        client
            .add_absence(NewAbsence {
                child_id: id,
                start_date: date(2024, 3, 4),
                end_date: Some(date(2024, 3, 5)),
                reason: Some("flu".to_string()),
            })
            .unwrap();
        // dropped without shutdown: every write already flushed
    }

    let store = Store::open(&path).unwrap();
    let children = db::fetch_children(&store).unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].birth_date, Some(date(2020, 1, 1)));

    let absences = db::fetch_absences_for_month(&store, MonthKey::new(2024, 3).unwrap()).unwrap();
    assert_eq!(absences.len(), 1);
    assert_eq!(absences[0].reason.as_deref(), Some("flu"));
    assert_eq!(absences[0].child_group, "Bears");
}

#[test]
fn ids_keep_increasing_across_reopens() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(DB_FILE_NAME);

    let first = {
        let store = Store::open(&path).unwrap();
        let id = db::insert_child(&store, "Anna", "", None).unwrap();
        assert!(db::delete_child(&store, id).unwrap());
        id
    };

    let store = Store::open(&path).unwrap();
    let second = db::insert_child(&store, "Ben", "", None).unwrap();
    assert!(second > first);
}

#[test]
fn every_write_rewrites_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(DB_FILE_NAME);
    let store = Store::open(&path).unwrap();
    let before = fs::metadata(&path).unwrap().len();

    let group = "g".repeat(200);
    for idx in 0..100 {
        db::insert_child(&store, &format!("Child {idx}"), &group, None).unwrap();
    }

    let after = fs::metadata(&path).unwrap().len();
    assert!(after > before);
    let leftovers = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn foreign_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(DB_FILE_NAME);
    fs::write(&path, b"name,group\nAnna,Bears\n").unwrap();

    let err = Store::open(&path).err().unwrap();
    assert!(err.to_string().contains("SQLite header"));
}

#[test]
fn empty_file_opens_as_fresh_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(DB_FILE_NAME);
    fs::write(&path, b"").unwrap();

    let store = Store::open(&path).unwrap();
    assert!(db::fetch_children(&store).unwrap().is_empty());
}
