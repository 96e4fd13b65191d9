use chrono::{Datelike, Duration, NaiveDate};

use crate::models::MonthKey;

/// Whether the picker selects one day or a `[start, end]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PickerMode {
    Single,
    Range,
}

/// What a click on a day did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PickOutcome {
    /// First click of a range.
    Started(NaiveDate),
    /// Second click landed before the start and became the new start.
    Restarted(NaiveDate),
    Committed(NaiveDate, NaiveDate),
}

/// Keyboard-driven month grid for choosing absence periods.
#[derive(Debug, Clone)]
pub(crate) struct DateRangePicker {
    pub(crate) mode: PickerMode,
    pub(crate) visible: MonthKey,
    pub(crate) cursor: NaiveDate,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRangePicker {
    /// Open on `initial` with that day already selected.
    pub(crate) fn new(mode: PickerMode, initial: NaiveDate) -> Self {
        Self {
            mode,
            visible: MonthKey::of(initial),
            cursor: initial,
            start: Some(initial),
            end: Some(initial),
        }
    }

    /// Switching modes collapses the selection onto the cursor.
    pub(crate) fn set_mode(&mut self, mode: PickerMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.start = Some(self.cursor);
        self.end = Some(self.cursor);
    }

    pub(crate) fn toggle_mode(&mut self) {
        let next = match self.mode {
            PickerMode::Single => PickerMode::Range,
            PickerMode::Range => PickerMode::Single,
        };
        self.set_mode(next);
    }

    pub(crate) fn click(&mut self, date: NaiveDate) -> PickOutcome {
        self.cursor = date;
        self.visible = MonthKey::of(date);

        match self.mode {
            PickerMode::Single => {
                self.start = Some(date);
                self.end = Some(date);
                PickOutcome::Committed(date, date)
            }
            PickerMode::Range => match (self.start, self.end) {
                (Some(start), None) if date < start => {
                    self.start = Some(date);
                    PickOutcome::Restarted(date)
                }
                (Some(start), None) => {
                    self.end = Some(date);
                    PickOutcome::Committed(start, date)
                }
                _ => {
                    self.start = Some(date);
                    self.end = None;
                    PickOutcome::Started(date)
                }
            },
        }
    }

    pub(crate) fn click_cursor(&mut self) -> PickOutcome {
        self.click(self.cursor)
    }

    /// Move the cursor by whole days. In single mode the selection follows.
    pub(crate) fn move_cursor(&mut self, days: i64) {
        let Some(target) = self.cursor.checked_add_signed(Duration::days(days)) else {
            return;
        };
        self.cursor = target;
        self.visible = MonthKey::of(target);
        if self.mode == PickerMode::Single {
            self.start = Some(target);
            self.end = Some(target);
        }
    }

    pub(crate) fn next_month(&mut self) {
        self.shift_month(self.visible.next());
    }

    pub(crate) fn prev_month(&mut self) {
        self.shift_month(self.visible.prev());
    }

    fn shift_month(&mut self, month: MonthKey) {
        let day = self.cursor.day().min(month.days_in_month());
        let Some(target) = NaiveDate::from_ymd_opt(month.year, month.month, day) else {
            return;
        };
        self.cursor = target;
        self.visible = month;
        if self.mode == PickerMode::Single {
            self.start = Some(self.cursor);
            self.end = Some(self.cursor);
        }
    }

    /// Completed selection, if any.
    pub(crate) fn selection(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Pending range start waiting for its second click.
    pub(crate) fn pending_start(&self) -> Option<NaiveDate> {
        match (self.start, self.end) {
            (Some(start), None) => Some(start),
            _ => None,
        }
    }

    pub(crate) fn in_range(&self, date: NaiveDate) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= date && date <= end,
            (Some(start), None) => date == start,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn second_click_before_start_restarts_the_range() {
        let mut picker = DateRangePicker::new(PickerMode::Range, date(2024, 3, 1));

        assert_eq!(picker.click(date(2024, 3, 10)), PickOutcome::Started(date(2024, 3, 10)));
        assert_eq!(picker.selection(), None);
        assert_eq!(picker.click(date(2024, 3, 5)), PickOutcome::Restarted(date(2024, 3, 5)));
        assert_eq!(picker.pending_start(), Some(date(2024, 3, 5)));
        assert_eq!(
            picker.click(date(2024, 3, 8)),
            PickOutcome::Committed(date(2024, 3, 5), date(2024, 3, 8))
        );
        assert_eq!(picker.selection(), Some((date(2024, 3, 5), date(2024, 3, 8))));
    }

    #[test]
    fn clicking_the_start_again_commits_a_single_day_range() {
        let mut picker = DateRangePicker::new(PickerMode::Range, date(2024, 3, 1));
        picker.click(date(2024, 3, 4));
        assert_eq!(
            picker.click(date(2024, 3, 4)),
            PickOutcome::Committed(date(2024, 3, 4), date(2024, 3, 4))
        );
    }

    #[test]
    fn a_committed_range_starts_over_on_the_next_click() {
        let mut picker = DateRangePicker::new(PickerMode::Range, date(2024, 3, 1));
        picker.click(date(2024, 3, 4));
        picker.click(date(2024, 3, 6));
        assert_eq!(picker.click(date(2024, 3, 2)), PickOutcome::Started(date(2024, 3, 2)));
        assert!(picker.in_range(date(2024, 3, 2)));
        assert!(!picker.in_range(date(2024, 3, 4)));
    }

    #[test]
    fn single_mode_follows_the_cursor() {
        let mut picker = DateRangePicker::new(PickerMode::Single, date(2024, 1, 31));
        picker.move_cursor(1);
        assert_eq!(picker.selection(), Some((date(2024, 2, 1), date(2024, 2, 1))));
        assert_eq!(picker.visible, MonthKey::new(2024, 2).unwrap());
    }

    #[test]
    fn month_navigation_clamps_the_day() {
        let mut picker = DateRangePicker::new(PickerMode::Range, date(2024, 1, 31));
        picker.next_month();
        assert_eq!(picker.cursor, date(2024, 2, 29));
        picker.prev_month();
        picker.prev_month();
        assert_eq!(picker.cursor, date(2023, 12, 29));
    }

    #[test]
    fn toggling_mode_collapses_selection_onto_cursor() {
        let mut picker = DateRangePicker::new(PickerMode::Range, date(2024, 3, 1));
        picker.click(date(2024, 3, 3));
        picker.click(date(2024, 3, 9));
        picker.toggle_mode();
        assert_eq!(picker.mode, PickerMode::Single);
        assert_eq!(picker.selection(), Some((date(2024, 3, 9), date(2024, 3, 9))));
    }
}
