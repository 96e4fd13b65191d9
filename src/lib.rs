//! Core library surface for the Kita absence tracker.
//!
//! `db` owns the SQLite store, `bridge` is the only way the UI reaches it, and
//! `export` turns already-loaded month statistics into a PDF.
pub mod bridge;
pub mod config;
pub mod csv_import;
pub mod db;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod ui;

pub use bridge::{Backend, Client, Request, Response};
pub use db::Store;
pub use error::{BridgeError, ExportError, StoreError};
pub use models::{AbsenceWithChild, Child, DayCount, MonthKey};
pub use ui::{run_app, App};
