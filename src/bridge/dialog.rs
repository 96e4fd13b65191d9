use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BridgeError, BridgeResult};

/// Extension accepted by the open-file dialog.
pub const CSV_EXTENSION: &str = "csv";

/// Something that lets the user choose a CSV file. `Ok(None)` means the user
/// cancelled.
pub trait FileDialog {
    fn pick_csv_file(&mut self) -> BridgeResult<Option<PathBuf>>;
}

/// Whether `path` carries the `.csv` extension (case-insensitive).
pub fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION))
        .unwrap_or(false)
}

/// Read the chosen file as text after re-checking the extension.
pub(crate) fn read_csv_file(path: &Path) -> BridgeResult<String> {
    if !is_csv_path(path) {
        return Err(BridgeError::Dialog(format!(
            "{} is not a .csv file",
            path.display()
        )));
    }
    fs::read_to_string(path)
        .map_err(|err| BridgeError::Dialog(format!("could not read {}: {err}", path.display())))
}

/// Dialog for contexts without a user, such as `kita exec`. Always cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDialog;

impl FileDialog for NoDialog {
    fn pick_csv_file(&mut self) -> BridgeResult<Option<PathBuf>> {
        Ok(None)
    }
}
