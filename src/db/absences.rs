use chrono::NaiveDate;
use rusqlite::params;

use super::access::decode_all;
use super::connection::Store;
use crate::error::StoreResult;
use crate::models::{AbsenceWithChild, DayCount, MonthKey};

/// Column list shared by the joined calendar queries.
const JOINED_COLUMNS: &str = "a.id, a.child_id, a.start_date, a.end_date, a.reason,
        k.name AS child_name, k.group_name AS child_group";

/// Absences overlapping any day of `month`, ordered by start date then child
/// name. Dates are ISO text, so overlap is a lexical range comparison.
pub fn fetch_absences_for_month(
    store: &Store,
    month: MonthKey,
) -> StoreResult<Vec<AbsenceWithChild>> {
    let (Some(first), Some(last)) = (month.first_day(), month.last_day()) else {
        return Ok(Vec::new());
    };

    let sql = format!(
        "SELECT {JOINED_COLUMNS}
         FROM absences a
         JOIN children k ON a.child_id = k.id
         WHERE a.start_date <= ?1 AND a.end_date >= ?2
         ORDER BY a.start_date, k.name"
    );
    let records = store.query_many(&sql, params![last.to_string(), first.to_string()])?;
    decode_all(records)
}

/// Absences whose range contains `day`, ordered by group then name.
pub fn fetch_absences_for_day(store: &Store, day: NaiveDate) -> StoreResult<Vec<AbsenceWithChild>> {
    let sql = format!(
        "SELECT {JOINED_COLUMNS}
         FROM absences a
         JOIN children k ON a.child_id = k.id
         WHERE a.start_date <= ?1 AND a.end_date >= ?1
         ORDER BY k.group_name, k.name"
    );
    let records = store.query_many(&sql, [day.to_string()])?;
    decode_all(records)
}

pub fn insert_absence(
    store: &Store,
    child_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: Option<&str>,
) -> StoreResult<i64> {
    store.execute(
        "INSERT INTO absences (child_id, start_date, end_date, reason) VALUES (?1, ?2, ?3, ?4)",
        params![
            child_id,
            start_date.to_string(),
            end_date.to_string(),
            reason
        ],
    )?;
    store.last_insert_id()
}

pub fn delete_absence(store: &Store, id: i64) -> StoreResult<bool> {
    let deleted = store.execute("DELETE FROM absences WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

/// One entry per day of `month` with the number of absences covering it.
pub fn month_statistics(store: &Store, month: MonthKey) -> StoreResult<Vec<DayCount>> {
    month
        .days()
        .into_iter()
        .map(|date| -> StoreResult<DayCount> {
            let iso = date.to_string();
            let count = store
                .query_one(
                    "SELECT COUNT(*) AS count FROM absences WHERE start_date <= ?1 AND end_date >= ?1",
                    [iso],
                )?
                .and_then(|record| record.get("count").and_then(|value| value.as_u64()))
                .unwrap_or(0);
            Ok(DayCount {
                date,
                count: count as u32,
            })
        })
        .collect()
}
