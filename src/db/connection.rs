use std::fs;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use log::{info, warn};
use rusqlite::serialize::OwnedData;
use rusqlite::{Connection, DatabaseName};

use super::fs::write_atomic;
use crate::error::{StoreError, StoreResult};

/// File name of the database inside the application data directory.
pub const DB_FILE_NAME: &str = "kita_absences.db";

/// Every SQLite file starts with this header.
const SQLITE_HEADER: &[u8] = b"SQLite format 3\0";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS children (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        group_name TEXT NOT NULL DEFAULT '',
        birth_date TEXT
    );

    CREATE TABLE IF NOT EXISTS absences (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        child_id INTEGER NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        reason TEXT,
        FOREIGN KEY (child_id) REFERENCES children(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_absences_dates
        ON absences(start_date, end_date);
";

/// The embedded database. Queries run against an in-memory SQLite connection;
/// every write serializes the whole database and replaces the file on disk.
pub struct Store {
    path: PathBuf,
    conn: Option<Connection>,
}

impl Store {
    /// Load the database file at `path` (or start empty when it does not exist
    /// yet), make sure the schema is present, and write the file once.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
            }
        }

        let mut conn = Connection::open_in_memory()?;
        if path.exists() {
            let bytes = fs::read(&path).map_err(|err| StoreError::io(&path, err))?;
            if bytes.is_empty() {
                warn!(
                    "event=store_open module=db status=empty_file path={}",
                    path.display()
                );
            } else {
                let data = owned_data_from_bytes(&bytes)?;
                conn.deserialize(DatabaseName::Main, data, false)?;
            }
        }

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        let store = Self {
            path,
            conn: Some(conn),
        };
        store.flush()?;

        info!(
            "event=store_open module=db status=ok path={}",
            store.path.display()
        );
        Ok(store)
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub(crate) fn conn(&self) -> StoreResult<&Connection> {
        self.conn.as_ref().ok_or(StoreError::Uninitialized)
    }

    /// Serialize the entire database and overwrite the file.
    pub fn flush(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        let data = conn.serialize(DatabaseName::Main)?;
        write_atomic(&self.path, data.as_ref()).map_err(|err| StoreError::io(&self.path, err))
    }

    /// Flush one last time and drop the connection. Later calls fail with
    /// [`StoreError::Uninitialized`].
    pub fn close(&mut self) -> StoreResult<()> {
        if self.conn.is_none() {
            return Ok(());
        }
        self.flush()?;
        self.conn = None;
        info!(
            "event=store_close module=db status=ok path={}",
            self.path.display()
        );
        Ok(())
    }
}

fn owned_data_from_bytes(bytes: &[u8]) -> StoreResult<OwnedData> {
    if !bytes.starts_with(SQLITE_HEADER) {
        return Err(StoreError::Corrupt("missing SQLite header".to_string()));
    }

    let size: i32 = bytes
        .len()
        .try_into()
        .map_err(|_| StoreError::Corrupt("database file too large".to_string()))?;

    // SAFETY: sqlite3_malloc returns either null (checked below) or a buffer of
    // exactly `size` bytes.
    let raw = unsafe { rusqlite::ffi::sqlite3_malloc(size) as *mut u8 };
    let ptr = NonNull::new(raw)
        .ok_or_else(|| StoreError::Corrupt("SQLite allocation failed".to_string()))?;

    // SAFETY: `ptr` is a fresh allocation of `bytes.len()` bytes that does not
    // overlap `bytes`; OwnedData takes ownership and frees it through SQLite.
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), bytes.len());
        Ok(OwnedData::from_raw_nonnull(ptr, bytes.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_directory_and_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(DB_FILE_NAME);

        let store = Store::open(&path).unwrap();

        assert!(store.is_open());
        assert!(path.exists());
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(SQLITE_HEADER));
    }

    #[test]
    fn open_is_idempotent_for_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DB_FILE_NAME);

        drop(Store::open(&path).unwrap());
        let store = Store::open(&path).unwrap();

        let tables: i64 = store
            .conn()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('children', 'absences')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn open_rejects_foreign_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DB_FILE_NAME);
        fs::write(&path, b"not a database").unwrap();

        let err = Store::open(&path).err().expect("garbage should not open");
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn closed_store_reports_uninitialized() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().join(DB_FILE_NAME)).unwrap();

        store.close().unwrap();

        assert!(!store.is_open());
        assert!(matches!(store.flush(), Err(StoreError::Uninitialized)));
        store.close().unwrap();
    }
}
