use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{AbsenceWithChild, Child, DayCount, MonthKey};

/// State behind the calendar tab: the visible month, the selected day and the
/// data last fetched for both.
pub(crate) struct CalendarScreen {
    pub(crate) month: MonthKey,
    pub(crate) selected: NaiveDate,
    pub(crate) stats: Vec<DayCount>,
    pub(crate) month_absences: Vec<AbsenceWithChild>,
    pub(crate) day_absences: Vec<AbsenceWithChild>,
    pub(crate) absence_selected: usize,
}

impl CalendarScreen {
    pub(crate) fn new(today: NaiveDate) -> Self {
        Self {
            month: MonthKey::of(today),
            selected: today,
            stats: Vec::new(),
            month_absences: Vec::new(),
            day_absences: Vec::new(),
            absence_selected: 0,
        }
    }

    pub(crate) fn count_for(&self, date: NaiveDate) -> u32 {
        self.stats
            .iter()
            .find(|day| day.date == date)
            .map(|day| day.count)
            .unwrap_or(0)
    }

    pub(crate) fn days_with_absences(&self) -> usize {
        self.stats.iter().filter(|day| day.count > 0).count()
    }

    pub(crate) fn total_absence_days(&self) -> u32 {
        self.stats.iter().map(|day| day.count).sum()
    }

    /// Distinct children with at least one absence touching the month.
    pub(crate) fn children_absent(&self) -> usize {
        let mut ids: Vec<i64> = self.month_absences.iter().map(|a| a.child_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Move the selected day. Returns `true` when the month changed and the
    /// month data has to be fetched again.
    pub(crate) fn move_days(&mut self, days: i64) -> bool {
        match self.selected.checked_add_signed(Duration::days(days)) {
            Some(target) => self.select(target),
            None => false,
        }
    }

    /// Step whole months, keeping the day of month where possible.
    pub(crate) fn shift_month(&mut self, delta: i32) -> bool {
        let mut month = self.month;
        for _ in 0..delta.unsigned_abs() {
            month = if delta > 0 { month.next() } else { month.prev() };
        }
        let day = self.selected.day().min(month.days_in_month());
        match NaiveDate::from_ymd_opt(month.year, month.month, day) {
            Some(target) => self.select(target),
            None => false,
        }
    }

    pub(crate) fn select(&mut self, date: NaiveDate) -> bool {
        let month = MonthKey::of(date);
        let changed = month != self.month;
        self.month = month;
        self.selected = date;
        self.absence_selected = 0;
        changed
    }

    pub(crate) fn set_month_data(&mut self, stats: Vec<DayCount>, absences: Vec<AbsenceWithChild>) {
        self.stats = stats;
        self.month_absences = absences;
    }

    pub(crate) fn set_day_absences(&mut self, absences: Vec<AbsenceWithChild>) {
        self.day_absences = absences;
        if self.day_absences.is_empty() {
            self.absence_selected = 0;
        } else if self.absence_selected >= self.day_absences.len() {
            self.absence_selected = self.day_absences.len() - 1;
        }
    }

    pub(crate) fn current_absence(&self) -> Option<&AbsenceWithChild> {
        self.day_absences.get(self.absence_selected)
    }

    pub(crate) fn move_absence_selection(&mut self, offset: isize) {
        if self.day_absences.is_empty() {
            return;
        }
        let last = self.day_absences.len() as isize - 1;
        self.absence_selected = (self.absence_selected as isize + offset).clamp(0, last) as usize;
    }
}

/// State behind the roster tab.
pub(crate) struct RosterScreen {
    pub(crate) children: Vec<Child>,
    pub(crate) filtered: Vec<Child>,
    pub(crate) filter: String,
    pub(crate) selected: usize,
}

impl RosterScreen {
    pub(crate) fn new(children: Vec<Child>) -> Self {
        let mut screen = Self {
            children,
            filtered: Vec::new(),
            filter: String::new(),
            selected: 0,
        };
        screen.apply_filter();
        screen
    }

    /// Case-insensitive match on name or group.
    pub(crate) fn apply_filter(&mut self) {
        let query = self.filter.trim().to_lowercase();
        self.filtered = if query.is_empty() {
            self.children.clone()
        } else {
            self.children
                .iter()
                .filter(|child| {
                    child.name.to_lowercase().contains(&query)
                        || child.group.to_lowercase().contains(&query)
                })
                .cloned()
                .collect()
        };
        self.ensure_in_bounds();
    }

    pub(crate) fn set_filter(&mut self, filter: String) {
        self.filter = filter;
        self.apply_filter();
    }

    /// Replace the data, keeping `focus_id` selected when it is still visible.
    pub(crate) fn set_children(&mut self, children: Vec<Child>, focus_id: Option<i64>) {
        self.children = children;
        self.apply_filter();
        if let Some(id) = focus_id {
            if let Some(idx) = self.filtered.iter().position(|child| child.id == id) {
                self.selected = idx;
            }
        }
    }

    pub(crate) fn current_child(&self) -> Option<&Child> {
        self.filtered.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let last = self.filtered.len() as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, last) as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.filtered.len().saturating_sub(1);
    }

    /// Distinct non-empty groups, sorted, for the group suggestion.
    pub(crate) fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = self
            .children
            .iter()
            .map(|child| child.group.trim())
            .filter(|group| !group.is_empty())
            .map(str::to_string)
            .collect();
        groups.sort();
        groups.dedup();
        groups
    }

    fn ensure_in_bounds(&mut self) {
        if self.filtered.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.filtered.len() {
            self.selected = self.filtered.len() - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn child(id: i64, name: &str, group: &str) -> Child {
        Child {
            id,
            name: name.to_string(),
            group: group.to_string(),
            birth_date: None,
        }
    }

    #[test]
    fn moving_across_month_boundary_reports_change() {
        let mut calendar = CalendarScreen::new(date(2024, 3, 31));
        assert!(!calendar.move_days(-1));
        assert!(calendar.move_days(2));
        assert_eq!(calendar.selected, date(2024, 4, 1));
        assert_eq!(calendar.month, MonthKey::new(2024, 4).unwrap());
    }

    #[test]
    fn shifting_months_clamps_to_shorter_months() {
        let mut calendar = CalendarScreen::new(date(2024, 1, 31));
        assert!(calendar.shift_month(1));
        assert_eq!(calendar.selected, date(2024, 2, 29));
        assert!(calendar.shift_month(-2));
        assert_eq!(calendar.selected, date(2023, 12, 29));
    }

    #[test]
    fn summary_counts_come_from_statistics() {
        let mut calendar = CalendarScreen::new(date(2024, 3, 1));
        calendar.set_month_data(
            vec![
                DayCount { date: date(2024, 3, 1), count: 2 },
                DayCount { date: date(2024, 3, 2), count: 0 },
                DayCount { date: date(2024, 3, 3), count: 1 },
            ],
            Vec::new(),
        );
        assert_eq!(calendar.count_for(date(2024, 3, 1)), 2);
        assert_eq!(calendar.count_for(date(2024, 3, 9)), 0);
        assert_eq!(calendar.days_with_absences(), 2);
        assert_eq!(calendar.total_absence_days(), 3);
    }

    #[test]
    fn roster_filter_matches_name_or_group() {
        let mut roster = RosterScreen::new(vec![
            child(1, "Anna", "Bears"),
            child(2, "Ben", ""),
            child(3, "Carla", "Foxes"),
        ]);
        roster.set_filter("BEA".to_string());
        assert_eq!(roster.filtered.len(), 1);
        assert_eq!(roster.current_child().map(|c| c.id), Some(1));

        roster.set_filter("an".to_string());
        let ids: Vec<i64> = roster.filtered.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1]);

        roster.set_filter(String::new());
        assert_eq!(roster.filtered.len(), 3);
        assert_eq!(roster.groups(), vec!["Bears".to_string(), "Foxes".to_string()]);
    }

    #[test]
    fn reload_keeps_focus_on_the_edited_child() {
        let mut roster = RosterScreen::new(vec![child(1, "Anna", "A"), child(2, "Ben", "B")]);
        roster.set_children(
            vec![child(1, "Anna", "A"), child(2, "Ben", "B"), child(3, "Cleo", "C")],
            Some(3),
        );
        assert_eq!(roster.current_child().map(|c| c.id), Some(3));

        roster.set_children(vec![child(1, "Anna", "A")], None);
        assert_eq!(roster.selected, 0);
    }
}
