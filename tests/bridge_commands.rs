use std::fs;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use tempfile::{tempdir, TempDir};

use kita_absence_tracker::bridge::{Backend, Client, FileDialog, NoDialog};
use kita_absence_tracker::db::{Store, DB_FILE_NAME};
use kita_absence_tracker::error::{BridgeError, BridgeResult, StoreError};
use kita_absence_tracker::models::{ChildUpdate, MonthKey, NewAbsence, NewChild};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn client() -> (TempDir, Client) {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path().join(DB_FILE_NAME)).unwrap();
    (dir, Client::new(Backend::new(store, Box::new(NoDialog))))
}

fn add_child(client: &mut Client, name: &str, group: &str) -> i64 {
    client
        .add_child(NewChild {
            name: name.to_string(),
            group: Some(group.to_string()),
            birth_date: None,
        })
        .unwrap()
}

fn add_absence(client: &mut Client, child_id: i64, start: NaiveDate, end: Option<NaiveDate>) -> i64 {
    client
        .add_absence(NewAbsence {
            child_id,
            start_date: start,
            end_date: end,
            reason: None,
        })
        .unwrap()
}

#[test]
fn added_children_appear_once_with_fresh_ids() {
    let (_dir, mut client) = client();
    let first = add_child(&mut client, "Anna", "Bears");
    let second = add_child(&mut client, "  Ben ", "Bears");
    assert_ne!(first, second);

    let children = client.list_children().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children.iter().filter(|c| c.id == first).count(), 1);
    let ben = children.iter().find(|c| c.id == second).unwrap();
    assert_eq!(ben.name, "Ben");
}

#[test]
fn blank_names_are_rejected_before_reaching_the_store() {
    let (_dir, mut client) = client();
    let err = client
        .add_child(NewChild {
            name: "   ".to_string(),
            ..NewChild::default()
        })
        .unwrap_err();
    assert!(matches!(err, BridgeError::Validation(_)));
    assert!(client.list_children().unwrap().is_empty());
}

#[test]
fn update_child_reports_whether_a_row_matched() {
    let (_dir, mut client) = client();
    let id = add_child(&mut client, "Anna", "Bears");

    let updated = client
        .update_child(ChildUpdate {
            id,
            name: "Anna Lena".to_string(),
            group: Some("Foxes".to_string()),
            birth_date: Some(date(2020, 5, 17)),
        })
        .unwrap();
    assert!(updated);

    let child = &client.list_children().unwrap()[0];
    assert_eq!(child.name, "Anna Lena");
    assert_eq!(child.group, "Foxes");
    assert_eq!(child.birth_date, Some(date(2020, 5, 17)));

    let missing = client
        .update_child(ChildUpdate {
            id: id + 100,
            name: "Nobody".to_string(),
            group: None,
            birth_date: None,
        })
        .unwrap();
    assert!(!missing);
}

#[test]
fn deleting_a_child_removes_its_absences_everywhere() {
    let (_dir, mut client) = client();
    let anna = add_child(&mut client, "Anna", "Bears");
    let ben = add_child(&mut client, "Ben", "Bears");
    add_absence(&mut client, anna, date(2024, 3, 4), Some(date(2024, 3, 6)));
    add_absence(&mut client, ben, date(2024, 3, 5), None);

    assert!(client.delete_child(anna).unwrap());

    let march = MonthKey::new(2024, 3).unwrap();
    let month = client.list_absences_for_month(march).unwrap();
    assert!(month.iter().all(|a| a.child_id != anna));
    assert_eq!(month.len(), 1);
    let day = client.list_absences_for_day(date(2024, 3, 5)).unwrap();
    assert_eq!(day.len(), 1);
    assert_eq!(day[0].child_name, "Ben");

    assert!(!client.delete_child(anna).unwrap());
}

#[test]
fn day_listing_contains_exactly_the_covering_absences() {
    let (_dir, mut client) = client();
    let anna = add_child(&mut client, "Anna", "Bears");
    let carl = add_child(&mut client, "Carl", "Ants");
    add_absence(&mut client, anna, date(2024, 3, 4), Some(date(2024, 3, 8)));
    add_absence(&mut client, carl, date(2024, 3, 8), None);
    add_absence(&mut client, carl, date(2024, 3, 11), None);

    for day in 1..=15 {
        let d = date(2024, 3, day);
        let listed = client.list_absences_for_day(d).unwrap();
        let expected = [
            (anna, date(2024, 3, 4), date(2024, 3, 8)),
            (carl, date(2024, 3, 8), date(2024, 3, 8)),
            (carl, date(2024, 3, 11), date(2024, 3, 11)),
        ]
        .iter()
        .filter(|(_, start, end)| *start <= d && d <= *end)
        .count();
        assert_eq!(listed.len(), expected, "day {d}");
        assert!(listed.iter().all(|a| a.covers(d)));
    }

    // group, then name: Ants before Bears
    let both = client.list_absences_for_day(date(2024, 3, 8)).unwrap();
    let names: Vec<&str> = both.iter().map(|a| a.child_name.as_str()).collect();
    assert_eq!(names, vec!["Carl", "Anna"]);
}

#[test]
fn month_listing_includes_ranges_crossing_the_boundary() {
    let (_dir, mut client) = client();
    let anna = add_child(&mut client, "Anna", "Bears");
    add_absence(&mut client, anna, date(2024, 2, 27), Some(date(2024, 3, 2)));
    add_absence(&mut client, anna, date(2024, 3, 31), Some(date(2024, 4, 3)));
    add_absence(&mut client, anna, date(2024, 4, 10), None);

    let march = client
        .list_absences_for_month(MonthKey::new(2024, 3).unwrap())
        .unwrap();
    let starts: Vec<NaiveDate> = march.iter().map(|a| a.start_date).collect();
    assert_eq!(starts, vec![date(2024, 2, 27), date(2024, 3, 31)]);
}

#[test]
fn statistics_cover_every_day_of_the_month() {
    let (_dir, mut client) = client();
    let anna = add_child(&mut client, "Anna", "Bears");
    let ben = add_child(&mut client, "Ben", "Bears");
    add_absence(&mut client, anna, date(2024, 2, 27), Some(date(2024, 3, 1)));
    add_absence(&mut client, ben, date(2024, 2, 29), None);

    for (month, days) in [(1, 31), (2, 29), (4, 30)] {
        let stats = client
            .statistics_for_month(MonthKey::new(2024, month).unwrap())
            .unwrap();
        assert_eq!(stats.len(), days);
    }
    let feb_2023 = client
        .statistics_for_month(MonthKey::new(2023, 2).unwrap())
        .unwrap();
    assert_eq!(feb_2023.len(), 28);

    let feb = client
        .statistics_for_month(MonthKey::new(2024, 2).unwrap())
        .unwrap();
    let count = |day: u32| feb.iter().find(|s| s.date == date(2024, 2, day)).unwrap().count;
    assert_eq!(count(26), 0);
    assert_eq!(count(27), 1);
    assert_eq!(count(29), 2);
}

#[test]
fn invalid_absences_are_rejected() {
    let (_dir, mut client) = client();
    let anna = add_child(&mut client, "Anna", "Bears");

    let backwards = client.add_absence(NewAbsence {
        child_id: anna,
        start_date: date(2024, 3, 8),
        end_date: Some(date(2024, 3, 4)),
        reason: None,
    });
    assert!(matches!(backwards, Err(BridgeError::Validation(_))));

    let orphan = client.add_absence(NewAbsence {
        child_id: anna + 41,
        start_date: date(2024, 3, 8),
        end_date: None,
        reason: None,
    });
    assert!(matches!(orphan, Err(BridgeError::Validation(_))));

    let bad_month = client.statistics_for_month(MonthKey { year: 2024, month: 13 });
    assert!(matches!(bad_month, Err(BridgeError::Validation(_))));
}

#[test]
fn months_past_the_calendar_range_are_rejected() {
    let (_dir, mut client) = client();
    let last = MonthKey {
        year: NaiveDate::MAX.year(),
        month: 12,
    };

    let listed = client.list_absences_for_month(last);
    assert!(matches!(listed, Err(BridgeError::Validation(_))));
    let stats = client.statistics_for_month(last);
    assert!(matches!(stats, Err(BridgeError::Validation(_))));

    let raw = format!(
        r#"{{"command":"list-absences-for-month","payload":{{"year":{},"month":12}}}}"#,
        last.year
    );
    let reply: Value = serde_json::from_str(&client.backend_mut().dispatch_json(&raw)).unwrap();
    assert!(reply["error"].as_str().unwrap().contains("out of range"));
}

#[test]
fn end_date_defaults_to_start_and_blank_reason_is_dropped() {
    let (_dir, mut client) = client();
    let anna = add_child(&mut client, "Anna", "Bears");
    client
        .add_absence(NewAbsence {
            child_id: anna,
            start_date: date(2024, 3, 4),
            end_date: None,
            reason: Some("  ".to_string()),
        })
        .unwrap();

    let listed = client.list_absences_for_day(date(2024, 3, 4)).unwrap();
    assert_eq!(listed[0].end_date, date(2024, 3, 4));
    assert_eq!(listed[0].reason, None);
}

#[test]
fn delete_absence_flags_missing_rows() {
    let (_dir, mut client) = client();
    let anna = add_child(&mut client, "Anna", "Bears");
    let id = add_absence(&mut client, anna, date(2024, 3, 4), None);

    assert!(client.delete_absence(id).unwrap());
    assert!(!client.delete_absence(id).unwrap());
}

#[test]
fn csv_example_imports_two_children() {
    let (_dir, mut client) = client();
    let content = "name,group,birth\nAnna,GroupA,2020-01-01\nBen,,\n".to_string();

    assert_eq!(client.import_children_csv(content).unwrap(), 2);

    let children = client.list_children().unwrap();
    let anna = children.iter().find(|c| c.name == "Anna").unwrap();
    assert_eq!(anna.group, "GroupA");
    assert_eq!(anna.birth_date, Some(date(2020, 1, 1)));
    let ben = children.iter().find(|c| c.name == "Ben").unwrap();
    assert_eq!(ben.group, "");
    assert_eq!(ben.birth_date, None);
}

#[test]
fn german_birth_dates_survive_the_import() {
    let (_dir, mut client) = client();
    let content = "name;group;birth\nFinn;Bears;01.02.2020\n".to_string();

    assert_eq!(client.import_children_csv(content).unwrap(), 1);

    let finn = &client.list_children().unwrap()[0];
    assert_eq!(finn.name, "Finn");
    assert_eq!(finn.birth_date, Some(date(2020, 2, 1)));
}

#[test]
fn unreadable_birth_date_rejects_the_whole_import() {
    let (_dir, mut client) = client();
    let content = "name,group,birth\nAnna,Bears,2020-01-01\nFinn,Bears,sometime\n".to_string();

    let err = client.import_children_csv(content).unwrap_err();
    assert!(matches!(err, BridgeError::Validation(_)));
    assert!(err.to_string().contains("line 3"));
    assert!(client.list_children().unwrap().is_empty());
}

#[test]
fn cancelled_dialog_returns_no_content() {
    let (_dir, mut client) = client();
    assert_eq!(client.open_file_dialog().unwrap(), None);
}

struct PickFile(PathBuf);

impl FileDialog for PickFile {
    fn pick_csv_file(&mut self) -> BridgeResult<Option<PathBuf>> {
        Ok(Some(self.0.clone()))
    }
}

#[test]
fn dialog_returns_the_chosen_csv_text() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("roster.csv");
    fs::write(&csv, "name;group\nMia;Owls\n").unwrap();
    let store = Store::open(dir.path().join(DB_FILE_NAME)).unwrap();
    let mut client = Client::new(Backend::new(store, Box::new(PickFile(csv))));

    let content = client.open_file_dialog().unwrap().unwrap();
    assert_eq!(client.import_children_csv(content).unwrap(), 1);
    assert_eq!(client.list_children().unwrap()[0].group, "Owls");
}

#[test]
fn json_wire_form_round_trips_commands() {
    let (_dir, mut client) = client();
    let backend = client.backend_mut();

    let created: Value = serde_json::from_str(&backend.dispatch_json(
        r#"{"command":"add-child","payload":{"name":"Anna","group":"Bears"}}"#,
    ))
    .unwrap();
    assert_eq!(created["ok"]["kind"], "created");
    let id = created["ok"]["data"]["id"].as_i64().unwrap();

    let listed: Value =
        serde_json::from_str(&backend.dispatch_json(r#"{"command":"list-children"}"#)).unwrap();
    assert_eq!(listed["ok"]["data"][0]["id"].as_i64(), Some(id));
    assert_eq!(listed["ok"]["data"][0]["name"], "Anna");

    let malformed: Value =
        serde_json::from_str(&backend.dispatch_json(r#"{"command":"fly"}"#)).unwrap();
    assert!(malformed["error"].as_str().unwrap().contains("malformed request"));
}

#[test]
fn every_command_fails_after_shutdown() {
    let (_dir, mut client) = client();
    client.backend_mut().shutdown().unwrap();

    let err = client.list_children().unwrap_err();
    assert!(matches!(err, BridgeError::Store(StoreError::Uninitialized)));
    assert_eq!(err.to_string(), "database not initialized");
    assert!(client
        .statistics_for_month(MonthKey::new(2024, 3).unwrap())
        .is_err());
}
