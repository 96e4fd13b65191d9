//! Domain models that mirror the SQLite schema and travel through the command
//! bridge. They stay plain data holders: persistence lives in `db`, shaping and
//! validation in `bridge`, and presentation in `ui`.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// A tracked child. The column for `group` is called `group_name` in SQL
/// because `group` is a reserved word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub id: i64,
    pub name: String,
    #[serde(rename = "group_name", alias = "group")]
    pub group: String,
    pub birth_date: Option<NaiveDate>,
}

impl Child {
    /// `Name (Group)` or just the name when no group is set.
    pub fn display_name(&self) -> String {
        if self.group.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.group)
        }
    }
}

impl fmt::Display for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Payload for creating a child.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChild {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

/// Payload for overwriting the mutable fields of a child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildUpdate {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

/// Payload for recording an absence. A missing `end_date` means a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAbsence {
    pub child_id: i64,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Absence joined with the owning child's name and group for calendar views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceWithChild {
    pub id: i64,
    pub child_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub child_name: String,
    pub child_group: String,
}

impl AbsenceWithChild {
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }

    pub fn is_single_day(&self) -> bool {
        self.start_date == self.end_date
    }

    /// `5.3.2024` for single days, `4.3. - 8.3.2024` for ranges.
    pub fn period_label(&self) -> String {
        if self.is_single_day() {
            self.start_date.format("%-d.%-m.%Y").to_string()
        } else {
            format!(
                "{} - {}",
                self.start_date.format("%-d.%-m."),
                self.end_date.format("%-d.%-m.%Y")
            )
        }
    }
}

/// Number of absences overlapping a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: u32,
}

/// A calendar month. `month` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    /// Returns `None` when `month` is outside `1..=12` or the month does not
    /// fit in the supported date range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let key = Self { year, month };
        key.is_valid().then_some(key)
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Both the first day and the first day of the following month must be
    /// representable, otherwise the month length is unknown.
    pub fn is_valid(&self) -> bool {
        self.first_day().is_some() && self.next().first_day().is_some()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        let first = self.first_day()?;
        let offset = self.days_in_month().checked_sub(1)?;
        first.checked_add_days(Days::new(u64::from(offset)))
    }

    /// Actual length of the month, leap years included.
    pub fn days_in_month(&self) -> u32 {
        let next = self.next();
        match (self.first_day(), next.first_day()) {
            (Some(first), Some(next_first)) => {
                next_first.signed_duration_since(first).num_days() as u32
            }
            _ => 0,
        }
    }

    /// Every date of the month in order.
    pub fn days(&self) -> Vec<NaiveDate> {
        match self.first_day() {
            Some(first) => first.iter_days().take(self.days_in_month() as usize).collect(),
            None => Vec::new(),
        }
    }

    pub fn next(&self) -> Self {
        if self.month >= 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month <= 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Blank cells before day 1 in a Monday-first week grid.
    pub fn leading_blanks(&self) -> u32 {
        self.first_day()
            .map(|first| first.weekday().num_days_from_monday())
            .unwrap_or(0)
    }

    /// `YYYY-MM`, used in export file names.
    pub fn iso_label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for MonthKey {
    /// `March 2024`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first_day() {
            Some(first) => write!(f, "{}", first.format("%B %Y")),
            None => write!(f, "{}", self.iso_label()),
        }
    }
}
