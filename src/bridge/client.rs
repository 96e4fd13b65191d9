use chrono::NaiveDate;

use super::{Backend, Request, Response};
use crate::error::{BridgeError, BridgeResult};
use crate::models::{AbsenceWithChild, Child, ChildUpdate, DayCount, MonthKey, NewAbsence, NewChild};

/// Typed front door to the [`Backend`] used by the view layer. Each method
/// issues one request and unwraps the matching response variant.
pub struct Client {
    backend: Backend,
}

impl Client {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut Backend {
        &mut self.backend
    }

    pub fn list_children(&mut self) -> BridgeResult<Vec<Child>> {
        match self.backend.dispatch(Request::ListChildren)? {
            Response::Children(children) => Ok(children),
            _ => Err(BridgeError::UnexpectedResponse("list-children")),
        }
    }

    pub fn add_child(&mut self, child: NewChild) -> BridgeResult<i64> {
        match self.backend.dispatch(Request::AddChild(child))? {
            Response::Created { id } => Ok(id),
            _ => Err(BridgeError::UnexpectedResponse("add-child")),
        }
    }

    pub fn update_child(&mut self, child: ChildUpdate) -> BridgeResult<bool> {
        match self.backend.dispatch(Request::UpdateChild(child))? {
            Response::Success(updated) => Ok(updated),
            _ => Err(BridgeError::UnexpectedResponse("update-child")),
        }
    }

    pub fn delete_child(&mut self, id: i64) -> BridgeResult<bool> {
        match self.backend.dispatch(Request::DeleteChild { id })? {
            Response::Success(deleted) => Ok(deleted),
            _ => Err(BridgeError::UnexpectedResponse("delete-child")),
        }
    }

    pub fn import_children_csv(&mut self, content: String) -> BridgeResult<usize> {
        match self.backend.dispatch(Request::ImportChildrenCsv { content })? {
            Response::Imported { count } => Ok(count),
            _ => Err(BridgeError::UnexpectedResponse("import-children-csv")),
        }
    }

    pub fn list_absences_for_month(&mut self, month: MonthKey) -> BridgeResult<Vec<AbsenceWithChild>> {
        match self.backend.dispatch(Request::ListAbsencesForMonth(month))? {
            Response::Absences(absences) => Ok(absences),
            _ => Err(BridgeError::UnexpectedResponse("list-absences-for-month")),
        }
    }

    pub fn list_absences_for_day(&mut self, date: NaiveDate) -> BridgeResult<Vec<AbsenceWithChild>> {
        match self.backend.dispatch(Request::ListAbsencesForDay { date })? {
            Response::Absences(absences) => Ok(absences),
            _ => Err(BridgeError::UnexpectedResponse("list-absences-for-day")),
        }
    }

    pub fn add_absence(&mut self, absence: NewAbsence) -> BridgeResult<i64> {
        match self.backend.dispatch(Request::AddAbsence(absence))? {
            Response::Created { id } => Ok(id),
            _ => Err(BridgeError::UnexpectedResponse("add-absence")),
        }
    }

    pub fn delete_absence(&mut self, id: i64) -> BridgeResult<bool> {
        match self.backend.dispatch(Request::DeleteAbsence { id })? {
            Response::Success(deleted) => Ok(deleted),
            _ => Err(BridgeError::UnexpectedResponse("delete-absence")),
        }
    }

    pub fn statistics_for_month(&mut self, month: MonthKey) -> BridgeResult<Vec<DayCount>> {
        match self.backend.dispatch(Request::StatisticsForMonth(month))? {
            Response::Statistics(stats) => Ok(stats),
            _ => Err(BridgeError::UnexpectedResponse("statistics-for-month")),
        }
    }

    /// `None` when the user cancelled the dialog.
    pub fn open_file_dialog(&mut self) -> BridgeResult<Option<String>> {
        match self.backend.dispatch(Request::OpenFileDialog)? {
            Response::FileContent(content) => Ok(content),
            _ => Err(BridgeError::UnexpectedResponse("open-file-dialog")),
        }
    }
}
