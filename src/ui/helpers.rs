use anyhow::Error;
use chrono::{Datelike, NaiveDate, Weekday};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::MonthKey;

const WEEKDAY_HEADERS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

pub(crate) fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Lay out a Monday-first month grid. `cell` renders one day into its text and
/// style; every cell is padded to `cell_width` columns.
pub(crate) fn month_grid_lines<F>(month: MonthKey, cell_width: usize, mut cell: F) -> Vec<Line<'static>>
where
    F: FnMut(NaiveDate) -> (String, Style),
{
    let header_style = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(
        WEEKDAY_HEADERS
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let style = if idx >= 5 {
                    header_style.fg(Color::DarkGray)
                } else {
                    header_style
                };
                Span::styled(format!("{name:^cell_width$}"), style)
            })
            .collect::<Vec<_>>(),
    )];

    let mut row: Vec<Span<'static>> = (0..month.leading_blanks())
        .map(|_| Span::raw(" ".repeat(cell_width)))
        .collect();
    for date in month.days() {
        let (text, style) = cell(date);
        row.push(Span::styled(format!("{text:^cell_width$}"), style));
        if row.len() == 7 {
            lines.push(Line::from(std::mem::take(&mut row)));
        }
    }
    if !row.is_empty() {
        lines.push(Line::from(row));
    }
    lines
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}
