use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{AbsenceWithChild, Child, NewAbsence};

use super::date_picker::{DateRangePicker, PickerMode};

/// Internal representation of the child form fields.
#[derive(Default, Clone)]
pub(crate) struct ChildForm {
    pub(crate) name: String,
    pub(crate) group: String,
    pub(crate) birth_date: String,
    pub(crate) active: ChildField,
    pub(crate) error: Option<String>,
    suggestion: Option<String>,
    autocomplete_disabled: bool,
}

/// Fields available within the child form.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub(crate) enum ChildField {
    #[default]
    Name,
    Group,
    BirthDate,
}

impl ChildForm {
    /// Populate the form from an existing child when editing.
    pub(crate) fn from_child(child: &Child) -> Self {
        Self {
            name: child.name.clone(),
            group: child.group.clone(),
            birth_date: child
                .birth_date
                .map(|date| date.to_string())
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Cycle focus across name, group and birth date.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            ChildField::Name => ChildField::Group,
            ChildField::Group => ChildField::BirthDate,
            ChildField::BirthDate => ChildField::Name,
        };
        if self.active != ChildField::Group {
            self.suggestion = None;
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            ChildField::Name => self.name.push(ch),
            ChildField::Group => {
                self.autocomplete_disabled = false;
                self.group.push(ch);
            }
            ChildField::BirthDate => {
                if !(ch.is_ascii_digit() || ch == '-') {
                    return false;
                }
                self.birth_date.push(ch);
            }
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            ChildField::Name => {
                self.name.pop();
            }
            ChildField::Group => {
                self.group.pop();
                self.autocomplete_disabled = false;
            }
            ChildField::BirthDate => {
                self.birth_date.pop();
            }
        }
    }

    /// Whether Enter may submit. The name is the only required field.
    pub(crate) fn can_submit(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Validate and normalize inputs: `(name, group, birth date)`.
    pub(crate) fn parse_inputs(&self) -> Result<(String, Option<String>, Option<NaiveDate>)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(anyhow!("Name is required."));
        }
        let group = self.group.trim();
        let group = (!group.is_empty()).then(|| group.to_string());
        let birth_raw = self.birth_date.trim();
        let birth_date = if birth_raw.is_empty() {
            None
        } else {
            Some(
                NaiveDate::parse_from_str(birth_raw, "%Y-%m-%d")
                    .map_err(|_| anyhow!("Birth date must look like YYYY-MM-DD."))?,
            )
        };
        Ok((name.to_string(), group, birth_date))
    }

    /// Suggest an existing group once two characters are typed.
    pub(crate) fn update_suggestion(&mut self, groups: &[String]) {
        if self.active != ChildField::Group
            || self.autocomplete_disabled
            || self.group.chars().count() < 2
        {
            self.suggestion = None;
            return;
        }

        let current_lower = self.group.to_lowercase();
        self.suggestion = groups
            .iter()
            .find(|candidate| candidate.to_lowercase().starts_with(&current_lower))
            .filter(|candidate| candidate.to_lowercase() != current_lower)
            .cloned();
    }

    pub(crate) fn accept_suggestion(&mut self) -> bool {
        match self.suggestion.take() {
            Some(candidate) if self.active == ChildField::Group => {
                self.group = candidate;
                self.autocomplete_disabled = true;
                true
            }
            _ => false,
        }
    }

    /// Dismiss the suggestion; returns whether there was one.
    pub(crate) fn cancel_autocomplete(&mut self) -> bool {
        if self.has_active_suggestion() {
            self.autocomplete_disabled = true;
            self.suggestion = None;
            return true;
        }
        false
    }

    pub(crate) fn has_active_suggestion(&self) -> bool {
        self.active == ChildField::Group && self.suggestion.is_some()
    }

    pub(crate) fn suggestion_suffix(&self) -> Option<String> {
        let candidate = self.suggestion.as_ref()?;
        let suffix: String = candidate.chars().skip(self.group.chars().count()).collect();
        (!suffix.is_empty()).then_some(suffix)
    }

    pub(crate) fn build_line(&self, field_name: &str, field: ChildField) -> Line<'static> {
        let (value, placeholder) = match field {
            ChildField::Name => (&self.name, "<required>"),
            ChildField::Group => (&self.group, "<optional>"),
            ChildField::BirthDate => (&self.birth_date, "<YYYY-MM-DD, optional>"),
        };
        let is_active = self.active == field;

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let mut spans = vec![Span::raw(format!("{field_name}: "))];
        if value.is_empty() && !(is_active && field == ChildField::Group) {
            spans.push(Span::styled(placeholder.to_string(), style));
        } else {
            spans.push(Span::styled(value.clone(), style));
        }
        if field == ChildField::Group && is_active {
            if let Some(suffix) = self.suggestion_suffix() {
                spans.push(Span::styled(suffix, Style::default().fg(Color::DarkGray)));
            }
        }
        Line::from(spans)
    }

    pub(crate) fn value_len(&self, field: ChildField) -> usize {
        match field {
            ChildField::Name => self.name.chars().count(),
            ChildField::Group => self.group.chars().count(),
            ChildField::BirthDate => self.birth_date.chars().count(),
        }
    }
}

/// Fields of the add-absence dialog in focus order.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub(crate) enum AbsenceField {
    #[default]
    Child,
    Period,
    Dates,
    Reason,
}

/// State of the add-absence dialog.
pub(crate) struct AbsenceForm {
    pub(crate) children: Vec<Child>,
    pub(crate) child_index: Option<usize>,
    pub(crate) picker: DateRangePicker,
    pub(crate) reason: String,
    pub(crate) active: AbsenceField,
    pub(crate) error: Option<String>,
}

impl AbsenceForm {
    pub(crate) fn new(children: Vec<Child>, day: NaiveDate) -> Self {
        let child_index = if children.is_empty() { None } else { Some(0) };
        Self {
            children,
            child_index,
            picker: DateRangePicker::new(PickerMode::Single, day),
            reason: String::new(),
            active: AbsenceField::Child,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            AbsenceField::Child => AbsenceField::Period,
            AbsenceField::Period => AbsenceField::Dates,
            AbsenceField::Dates => AbsenceField::Reason,
            AbsenceField::Reason => AbsenceField::Child,
        };
    }

    pub(crate) fn toggle_field_back(&mut self) {
        self.active = match self.active {
            AbsenceField::Child => AbsenceField::Reason,
            AbsenceField::Period => AbsenceField::Child,
            AbsenceField::Dates => AbsenceField::Period,
            AbsenceField::Reason => AbsenceField::Dates,
        };
    }

    /// Step through the child list, wrapping at both ends.
    pub(crate) fn cycle_child(&mut self, offset: isize) {
        if self.children.is_empty() {
            self.child_index = None;
            return;
        }
        let len = self.children.len() as isize;
        let current = self.child_index.unwrap_or(0) as isize;
        self.child_index = Some((current + offset).rem_euclid(len) as usize);
    }

    pub(crate) fn selected_child(&self) -> Option<&Child> {
        self.child_index.and_then(|idx| self.children.get(idx))
    }

    pub(crate) fn push_reason_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.reason.push(ch);
        true
    }

    /// Saving needs a child and a completed period.
    pub(crate) fn can_submit(&self) -> bool {
        self.selected_child().is_some() && self.picker.selection().is_some()
    }

    pub(crate) fn to_request(&self) -> Result<NewAbsence> {
        let child = self
            .selected_child()
            .ok_or_else(|| anyhow!("Select a child first."))?;
        let (start_date, end_date) = self
            .picker
            .selection()
            .ok_or_else(|| anyhow!("Pick the last day of the absence."))?;
        let reason = self.reason.trim();
        Ok(NewAbsence {
            child_id: child.id,
            start_date,
            end_date: Some(end_date),
            reason: (!reason.is_empty()).then(|| reason.to_string()),
        })
    }

    pub(crate) fn period_label(&self) -> String {
        match (self.picker.selection(), self.picker.pending_start()) {
            (Some((start, end)), _) if start == end => start.format("%d.%m.%Y").to_string(),
            (Some((start, end)), _) => {
                format!("{} - {}", start.format("%d.%m.%Y"), end.format("%d.%m.%Y"))
            }
            (None, Some(start)) => format!("{} - ?", start.format("%d.%m.%Y")),
            (None, None) => "-".to_string(),
        }
    }
}

/// Save-path prompt for the PDF export.
pub(crate) struct ExportForm {
    pub(crate) path: String,
    pub(crate) error: Option<String>,
}

impl ExportForm {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path: path.to_string_lossy().to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.path.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.path.pop();
    }

    pub(crate) fn target(&self) -> Result<PathBuf> {
        let path = self.path.trim();
        if path.is_empty() {
            return Err(anyhow!("Choose a file to save the report to."));
        }
        let mut target = PathBuf::from(path);
        if target.extension().is_none() {
            target.set_extension("pdf");
        }
        Ok(target)
    }
}

/// Pending removal of a child and all of its absences.
pub(crate) struct ConfirmChildDelete {
    pub(crate) child: Child,
}

pub(crate) struct ConfirmAbsenceDelete {
    pub(crate) absence: AbsenceWithChild,
}
