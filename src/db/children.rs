use log::warn;
use rusqlite::params;

use super::access::{decode, decode_all};
use super::connection::Store;
use crate::csv_import::CsvChild;
use crate::error::StoreResult;
use crate::models::Child;

/// Every child, grouped the way the roster shows them.
pub fn fetch_children(store: &Store) -> StoreResult<Vec<Child>> {
    let records = store.query_many(
        "SELECT id, name, group_name, birth_date
         FROM children
         ORDER BY group_name, name",
        [],
    )?;
    decode_all(records)
}

pub fn fetch_child(store: &Store, id: i64) -> StoreResult<Option<Child>> {
    store
        .query_one(
            "SELECT id, name, group_name, birth_date FROM children WHERE id = ?1",
            [id],
        )?
        .map(decode)
        .transpose()
}

/// Insert a child and return the id the store assigned.
pub fn insert_child(
    store: &Store,
    name: &str,
    group: &str,
    birth_date: Option<&str>,
) -> StoreResult<i64> {
    store.execute(
        "INSERT INTO children (name, group_name, birth_date) VALUES (?1, ?2, ?3)",
        params![name, group, birth_date],
    )?;
    store.last_insert_id()
}

/// Overwrite name, group and birth date. Returns `false` when no row matched.
pub fn update_child(
    store: &Store,
    id: i64,
    name: &str,
    group: &str,
    birth_date: Option<&str>,
) -> StoreResult<bool> {
    let updated = store.execute(
        "UPDATE children SET name = ?1, group_name = ?2, birth_date = ?3 WHERE id = ?4",
        params![name, group, birth_date, id],
    )?;
    Ok(updated > 0)
}

/// Remove a child together with its absences. The absences are deleted
/// explicitly before the child so the result does not depend on the foreign
/// key pragma; both statements commit together.
pub fn delete_child(store: &Store, id: i64) -> StoreResult<bool> {
    store.write_batch(|conn| {
        conn.execute("DELETE FROM absences WHERE child_id = ?1", [id])?;
        let deleted = conn.execute("DELETE FROM children WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    })
}

/// Insert the parsed CSV rows in one transaction and return how many were
/// written.
pub fn import_children(store: &Store, rows: &[CsvChild]) -> StoreResult<usize> {
    if rows.is_empty() {
        warn!("event=csv_import module=db status=empty");
        return Ok(0);
    }

    store.write_batch(|conn| {
        let mut stmt = conn.prepare(
            "INSERT INTO children (name, group_name, birth_date) VALUES (?1, ?2, ?3)",
        )?;
        let mut count = 0;
        for row in rows {
            let birth_date = row.birth_date.map(|date| date.to_string());
            stmt.execute(params![row.name, row.group, birth_date])?;
            count += 1;
        }
        Ok(count)
    })
}
