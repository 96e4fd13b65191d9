//! The four data access primitives every query is built on, plus the batch
//! helper used by multi-statement commands.

use log::debug;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Params, Row};
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use super::connection::Store;
use crate::error::StoreResult;

/// A result row keyed by column name.
pub type Record = Map<String, Value>;

impl Store {
    /// Run `sql` and return every row as a [`Record`]. No rows is not an error.
    pub fn query_many<P: Params>(&self, sql: &str, params: P) -> StoreResult<Vec<Record>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();

        let mut rows = stmt.query(params)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(row_to_record(row, &names)?);
        }
        Ok(records)
    }

    /// Like [`Store::query_many`] but only the first row.
    pub fn query_one<P: Params>(&self, sql: &str, params: P) -> StoreResult<Option<Record>> {
        Ok(self.query_many(sql, params)?.into_iter().next())
    }

    /// Run a mutating statement, flush the store, and return the number of
    /// modified rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> StoreResult<usize> {
        let changed = self.conn()?.execute(sql, params)?;
        self.flush()?;
        debug!("event=store_execute module=db status=ok changed={changed}");
        Ok(changed)
    }

    /// Id assigned by the most recent insert on this connection.
    pub fn last_insert_id(&self) -> StoreResult<i64> {
        Ok(self.conn()?.last_insert_rowid())
    }

    /// Run several statements in one transaction and flush once on commit.
    /// Nothing is written to disk when `work` fails.
    pub fn write_batch<T, F>(&self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let value = work(&tx)?;
        tx.commit()?;
        self.flush()?;
        Ok(value)
    }
}

/// Decode a record into a typed model.
pub fn decode<T: DeserializeOwned>(record: Record) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

pub fn decode_all<T: DeserializeOwned>(records: Vec<Record>) -> StoreResult<Vec<T>> {
    records.into_iter().map(decode).collect()
}

fn row_to_record(row: &Row<'_>, names: &[String]) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (idx, name) in names.iter().enumerate() {
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(value) => Value::from(value),
            ValueRef::Real(value) => Number::from_f64(value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
            ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
        };
        record.insert(name.clone(), value);
    }
    Ok(record)
}
