//! Persistence module split across logical submodules.

mod absences;
mod access;
mod children;
mod connection;
mod fs;

pub use absences::{
    delete_absence, fetch_absences_for_day, fetch_absences_for_month,
    insert_absence, month_statistics,
};
pub use access::{decode, decode_all, Record};
pub use children::{
    delete_child, fetch_child, fetch_children, import_children, insert_child, update_child,
};
pub use connection::{Store, DB_FILE_NAME};
