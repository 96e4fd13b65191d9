//! Command bridge between the view layer and the store.
//!
//! Every operation the UI may perform is a variant of [`Request`]; the
//! [`Backend`] validates the payload, runs exactly one data access call (or one
//! transaction) and answers with a [`Response`]. The same types travel as JSON
//! through [`Backend::dispatch_json`], keyed by stable kebab-case names.

mod client;
mod dialog;

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::csv_import::parse_children_csv;
use crate::db::{self, Store};
use crate::error::{BridgeError, BridgeResult};
use crate::models::{AbsenceWithChild, Child, ChildUpdate, DayCount, MonthKey, NewAbsence, NewChild};

pub use client::Client;
pub use dialog::{is_csv_path, FileDialog, NoDialog, CSV_EXTENSION};

/// One request per command the UI can issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "payload", rename_all = "kebab-case")]
pub enum Request {
    ListChildren,
    AddChild(NewChild),
    UpdateChild(ChildUpdate),
    DeleteChild { id: i64 },
    ImportChildrenCsv { content: String },
    ListAbsencesForMonth(MonthKey),
    ListAbsencesForDay { date: NaiveDate },
    AddAbsence(NewAbsence),
    DeleteAbsence { id: i64 },
    StatisticsForMonth(MonthKey),
    OpenFileDialog,
}

impl Request {
    /// Stable wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Request::ListChildren => "list-children",
            Request::AddChild(_) => "add-child",
            Request::UpdateChild(_) => "update-child",
            Request::DeleteChild { .. } => "delete-child",
            Request::ImportChildrenCsv { .. } => "import-children-csv",
            Request::ListAbsencesForMonth(_) => "list-absences-for-month",
            Request::ListAbsencesForDay { .. } => "list-absences-for-day",
            Request::AddAbsence(_) => "add-absence",
            Request::DeleteAbsence { .. } => "delete-absence",
            Request::StatisticsForMonth(_) => "statistics-for-month",
            Request::OpenFileDialog => "open-file-dialog",
        }
    }
}

/// Result payloads. Each request maps to exactly one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum Response {
    Children(Vec<Child>),
    Created { id: i64 },
    /// `true` when the statement touched at least one row.
    Success(bool),
    Imported { count: usize },
    Absences(Vec<AbsenceWithChild>),
    Statistics(Vec<DayCount>),
    /// Text of the chosen file, `None` when the user cancelled.
    FileContent(Option<String>),
}

/// Owns the store and the file dialog and executes requests against them.
pub struct Backend {
    store: Store,
    dialog: Box<dyn FileDialog>,
}

impl Backend {
    pub fn new(store: Store, dialog: Box<dyn FileDialog>) -> Self {
        Self { store, dialog }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Validate `request`, run it, and shape the result.
    pub fn dispatch(&mut self, request: Request) -> BridgeResult<Response> {
        let name = request.name();
        debug!("event=command module=bridge command={name} status=start");

        let result = self.run(request);
        match &result {
            Ok(_) => debug!("event=command module=bridge command={name} status=ok"),
            Err(err) => warn!("event=command module=bridge command={name} status=error error={err}"),
        }
        result
    }

    /// JSON in, JSON out: `{"ok": <response>}` or `{"error": "<message>"}`.
    pub fn dispatch_json(&mut self, raw: &str) -> String {
        let outcome = serde_json::from_str::<Request>(raw)
            .map_err(|err| BridgeError::validation(format!("malformed request: {err}")))
            .and_then(|request| self.dispatch(request));

        match outcome {
            Ok(response) => json!({ "ok": response }).to_string(),
            Err(err) => json!({ "error": err.to_string() }).to_string(),
        }
    }

    /// Flush and close the store. Every later request fails with the
    /// uninitialized-store error.
    pub fn shutdown(&mut self) -> BridgeResult<()> {
        self.store.close()?;
        info!("event=shutdown module=bridge status=ok");
        Ok(())
    }

    fn run(&mut self, request: Request) -> BridgeResult<Response> {
        match request {
            Request::ListChildren => Ok(Response::Children(db::fetch_children(&self.store)?)),
            Request::AddChild(child) => {
                let name = required_name(&child.name)?;
                let group = normalize_group(child.group.as_deref());
                let birth_date = child.birth_date.map(|date| date.to_string());
                let id = db::insert_child(&self.store, &name, &group, birth_date.as_deref())?;
                Ok(Response::Created { id })
            }
            Request::UpdateChild(child) => {
                let name = required_name(&child.name)?;
                let group = normalize_group(child.group.as_deref());
                let birth_date = child.birth_date.map(|date| date.to_string());
                let updated =
                    db::update_child(&self.store, child.id, &name, &group, birth_date.as_deref())?;
                Ok(Response::Success(updated))
            }
            Request::DeleteChild { id } => Ok(Response::Success(db::delete_child(&self.store, id)?)),
            Request::ImportChildrenCsv { content } => {
                let rows = parse_children_csv(&content)
                    .map_err(|err| BridgeError::validation(err.to_string()))?;
                let count = db::import_children(&self.store, &rows)?;
                info!("event=csv_import module=bridge status=ok count={count}");
                Ok(Response::Imported { count })
            }
            Request::ListAbsencesForMonth(month) => {
                let month = valid_month(month)?;
                Ok(Response::Absences(db::fetch_absences_for_month(
                    &self.store,
                    month,
                )?))
            }
            Request::ListAbsencesForDay { date } => Ok(Response::Absences(
                db::fetch_absences_for_day(&self.store, date)?,
            )),
            Request::AddAbsence(absence) => {
                let end_date = absence.end_date.unwrap_or(absence.start_date);
                if end_date < absence.start_date {
                    return Err(BridgeError::validation(
                        "End date may not precede the start date.",
                    ));
                }
                if db::fetch_child(&self.store, absence.child_id)?.is_none() {
                    return Err(BridgeError::validation(format!(
                        "Child {} does not exist.",
                        absence.child_id
                    )));
                }
                let reason = normalize_optional(absence.reason.as_deref());
                let id = db::insert_absence(
                    &self.store,
                    absence.child_id,
                    absence.start_date,
                    end_date,
                    reason.as_deref(),
                )?;
                Ok(Response::Created { id })
            }
            Request::DeleteAbsence { id } => {
                Ok(Response::Success(db::delete_absence(&self.store, id)?))
            }
            Request::StatisticsForMonth(month) => {
                let month = valid_month(month)?;
                Ok(Response::Statistics(db::month_statistics(&self.store, month)?))
            }
            Request::OpenFileDialog => {
                let content = match self.dialog.pick_csv_file()? {
                    Some(path) => Some(dialog::read_csv_file(&path)?),
                    None => None,
                };
                Ok(Response::FileContent(content))
            }
        }
    }
}

fn required_name(raw: &str) -> BridgeResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        Err(BridgeError::validation("Name is required."))
    } else {
        Ok(name.to_string())
    }
}

fn normalize_group(raw: Option<&str>) -> String {
    raw.map(str::trim).unwrap_or_default().to_string()
}

fn normalize_optional(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn valid_month(month: MonthKey) -> BridgeResult<MonthKey> {
    if month.is_valid() {
        Ok(month)
    } else {
        Err(BridgeError::validation(format!(
            "Month {} is out of range.",
            month.iso_label()
        )))
    }
}
