use std::mem;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use crossterm::event::KeyCode;
use log::{error, info, warn};
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use ratatui::Frame;

use crate::bridge::Client;
use crate::config::AppConfig;
use crate::export::{default_file_name, export_month, MonthReport};
use crate::models::{ChildUpdate, NewChild};

use super::date_picker::PickerMode;
use super::forms::{
    AbsenceField, AbsenceForm, ChildField, ChildForm, ConfirmAbsenceDelete, ConfirmChildDelete,
    ExportForm,
};
use super::helpers::{centered_rect, is_weekend, month_grid_lines, surface_error};
use super::screens::{CalendarScreen, RosterScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const TAB_BAR_HEIGHT: u16 = 3;
const CALENDAR_CELL_WIDTH: usize = 8;
const PICKER_CELL_WIDTH: usize = 4;
const SUMMARY_HEIGHT: u16 = 5;

#[derive(Copy, Clone, PartialEq, Eq)]
enum Tab {
    Calendar,
    Roster,
}

/// Modal state layered over the active tab.
enum Mode {
    Normal,
    AddingAbsence(AbsenceForm),
    ConfirmAbsenceDelete(ConfirmAbsenceDelete),
    Exporting(ExportForm),
    AddingChild(ChildForm),
    EditingChild { id: i64, form: ChildForm },
    ConfirmChildDelete(ConfirmChildDelete),
    /// Live roster search; `previous` is restored on Esc.
    Searching { query: String, previous: String },
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Application state driven by the terminal loop. All data goes through the
/// command bridge; the app only keeps what the last fetch returned.
pub struct App {
    client: Client,
    tab: Tab,
    mode: Mode,
    calendar: CalendarScreen,
    roster: RosterScreen,
    status: Option<StatusMessage>,
    today: NaiveDate,
    export_dir: PathBuf,
    open_after_export: bool,
    needs_full_redraw: bool,
}

impl App {
    pub fn new(client: Client, config: &AppConfig) -> Self {
        let today = Local::now().date_naive();
        let mut app = Self {
            client,
            tab: Tab::Calendar,
            mode: Mode::Normal,
            calendar: CalendarScreen::new(today),
            roster: RosterScreen::new(Vec::new()),
            status: None,
            today,
            export_dir: config.export_dir(),
            open_after_export: config.export.open_after_export,
            needs_full_redraw: false,
        };
        app.reload_all();
        app
    }

    /// Give the client back, e.g. to shut the backend down after the loop.
    pub fn into_client(self) -> Client {
        self.client
    }

    /// Whether something else wrote to the terminal since the last frame.
    pub(crate) fn take_redraw_request(&mut self) -> bool {
        mem::take(&mut self.needs_full_redraw)
    }

    /// Returns `true` when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingAbsence(form) => self.handle_add_absence(code, form)?,
            Mode::ConfirmAbsenceDelete(confirm) => self.handle_confirm_absence_delete(code, confirm)?,
            Mode::Exporting(form) => self.handle_export(code, form)?,
            Mode::AddingChild(form) => self.handle_child_form(code, None, form)?,
            Mode::EditingChild { id, form } => self.handle_child_form(code, Some(id), form)?,
            Mode::ConfirmChildDelete(confirm) => self.handle_confirm_child_delete(code, confirm)?,
            Mode::Searching { query, previous } => self.handle_search(code, query, previous)?,
        };

        Ok(exit)
    }

    /// Re-fetch everything from the store.
    pub(crate) fn handle_ctrl_r(&mut self) -> Result<()> {
        self.reload_all();
        self.set_status("Reloaded.", StatusKind::Info);
        Ok(())
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => {
                *exit = true;
                return Ok(Mode::Normal);
            }
            KeyCode::Char('1') => {
                self.tab = Tab::Calendar;
                return Ok(Mode::Normal);
            }
            KeyCode::Char('2') => {
                self.tab = Tab::Roster;
                return Ok(Mode::Normal);
            }
            KeyCode::Tab => {
                self.tab = match self.tab {
                    Tab::Calendar => Tab::Roster,
                    Tab::Roster => Tab::Calendar,
                };
                return Ok(Mode::Normal);
            }
            _ => {}
        }

        match self.tab {
            Tab::Calendar => self.handle_calendar_key(code),
            Tab::Roster => self.handle_roster_key(code),
        }
    }

    fn handle_calendar_key(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Left => self.move_day(-1),
            KeyCode::Right => self.move_day(1),
            KeyCode::Up => self.move_day(-7),
            KeyCode::Down => self.move_day(7),
            KeyCode::PageUp | KeyCode::Char('<') => self.shift_month(-1),
            KeyCode::PageDown | KeyCode::Char('>') => self.shift_month(1),
            KeyCode::Char('t') => {
                let today = self.today;
                if self.calendar.select(today) {
                    self.reload_month();
                }
                self.reload_day();
            }
            KeyCode::Char('j') => self.calendar.move_absence_selection(1),
            KeyCode::Char('k') => self.calendar.move_absence_selection(-1),
            KeyCode::Char('a') => {
                self.clear_status();
                let form = AbsenceForm::new(self.roster.children.clone(), self.calendar.selected);
                return Ok(Mode::AddingAbsence(form));
            }
            KeyCode::Char('d') => {
                if let Some(absence) = self.calendar.current_absence().cloned() {
                    self.clear_status();
                    return Ok(Mode::ConfirmAbsenceDelete(ConfirmAbsenceDelete { absence }));
                }
                self.set_status("No absence selected to delete.", StatusKind::Error);
            }
            KeyCode::Char('x') => {
                self.clear_status();
                let path = self.export_dir.join(default_file_name(self.calendar.month));
                return Ok(Mode::Exporting(ExportForm::new(path)));
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_roster_key(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Up => self.roster.move_selection(-1),
            KeyCode::Down => self.roster.move_selection(1),
            KeyCode::PageUp => self.roster.move_selection(-10),
            KeyCode::PageDown => self.roster.move_selection(10),
            KeyCode::Home => self.roster.select_first(),
            KeyCode::End => self.roster.select_last(),
            KeyCode::Esc => {
                if !self.roster.filter.is_empty() {
                    self.roster.set_filter(String::new());
                    self.set_status("Filter cleared.", StatusKind::Info);
                }
            }
            KeyCode::Char('/') => {
                let previous = self.roster.filter.clone();
                return Ok(Mode::Searching {
                    query: previous.clone(),
                    previous,
                });
            }
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingChild(ChildForm::default()));
            }
            KeyCode::Char('e') => {
                if let Some(child) = self.roster.current_child() {
                    let id = child.id;
                    let form = ChildForm::from_child(child);
                    self.clear_status();
                    return Ok(Mode::EditingChild { id, form });
                }
                self.set_status("No child selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('-') => {
                if let Some(child) = self.roster.current_child().cloned() {
                    self.clear_status();
                    return Ok(Mode::ConfirmChildDelete(ConfirmChildDelete { child }));
                }
                self.set_status("No child selected to delete.", StatusKind::Error);
            }
            KeyCode::Char('i') => self.import_csv(),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_add_absence(&mut self, code: KeyCode, mut form: AbsenceForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Add absence cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab => form.toggle_field(),
            KeyCode::BackTab => form.toggle_field_back(),
            KeyCode::Enter => {
                if !form.can_submit() {
                    form.error = Some(if form.selected_child().is_none() {
                        "Select a child first.".to_string()
                    } else {
                        "Pick the last day of the absence.".to_string()
                    });
                    return Ok(Mode::AddingAbsence(form));
                }
                match self.save_absence(&form) {
                    Ok(()) => return Ok(Mode::Normal),
                    Err(err) => {
                        let message = surface_error(&err);
                        error!("event=add_absence module=ui status=error error={message}");
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
            _ => {
                form.error = None;
                match form.active {
                    AbsenceField::Child => match code {
                        KeyCode::Up | KeyCode::Left => form.cycle_child(-1),
                        KeyCode::Down | KeyCode::Right => form.cycle_child(1),
                        _ => {}
                    },
                    AbsenceField::Period => match code {
                        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => {
                            form.picker.toggle_mode()
                        }
                        KeyCode::Char('s') => form.picker.set_mode(PickerMode::Single),
                        KeyCode::Char('r') => form.picker.set_mode(PickerMode::Range),
                        _ => {}
                    },
                    AbsenceField::Dates => match code {
                        KeyCode::Left => form.picker.move_cursor(-1),
                        KeyCode::Right => form.picker.move_cursor(1),
                        KeyCode::Up => form.picker.move_cursor(-7),
                        KeyCode::Down => form.picker.move_cursor(7),
                        KeyCode::PageUp | KeyCode::Char('<') => form.picker.prev_month(),
                        KeyCode::PageDown | KeyCode::Char('>') => form.picker.next_month(),
                        KeyCode::Char(' ') => {
                            form.picker.click_cursor();
                        }
                        _ => {}
                    },
                    AbsenceField::Reason => match code {
                        KeyCode::Backspace => {
                            form.reason.pop();
                        }
                        KeyCode::Char(ch) => {
                            form.push_reason_char(ch);
                        }
                        _ => {}
                    },
                }
            }
        }
        Ok(Mode::AddingAbsence(form))
    }

    fn handle_confirm_absence_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmAbsenceDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_absence_delete(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        let message = surface_error(&err);
                        error!("event=delete_absence module=ui status=error error={message}");
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmAbsenceDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmAbsenceDelete(confirm)),
        }
    }

    fn handle_export(&mut self, code: KeyCode, mut form: ExportForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Export cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.run_export(&form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => {
                    let message = surface_error(&err);
                    error!("event=export module=ui status=error error={message}");
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::Exporting(form))
    }

    /// Shared by the add and edit dialogs; `id` is set when editing.
    fn handle_child_form(&mut self, code: KeyCode, id: Option<i64>, mut form: ChildForm) -> Result<Mode> {
        let groups = self.roster.groups();
        match code {
            KeyCode::Esc => {
                if !form.cancel_autocomplete() {
                    let message = if id.is_some() {
                        "Edit cancelled."
                    } else {
                        "Add child cancelled."
                    };
                    self.set_status(message, StatusKind::Info);
                    return Ok(Mode::Normal);
                }
            }
            KeyCode::Tab => {
                let consumed = form.has_active_suggestion() && form.accept_suggestion();
                if !consumed {
                    form.toggle_field();
                }
                form.update_suggestion(&groups);
            }
            KeyCode::BackTab => {
                form.toggle_field();
                form.toggle_field();
                form.update_suggestion(&groups);
            }
            KeyCode::Backspace => {
                form.backspace();
                form.update_suggestion(&groups);
            }
            KeyCode::Enter => {
                if !form.can_submit() {
                    form.error = Some("Name is required.".to_string());
                } else {
                    match self.save_child(id, &form) {
                        Ok(()) => return Ok(Mode::Normal),
                        Err(err) => {
                            let message = surface_error(&err);
                            error!("event=save_child module=ui status=error error={message}");
                            form.error = Some(message.clone());
                            self.set_status(message, StatusKind::Error);
                        }
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                    form.update_suggestion(&groups);
                }
            }
            _ => {}
        }

        Ok(match id {
            Some(id) => Mode::EditingChild { id, form },
            None => Mode::AddingChild(form),
        })
    }

    fn handle_confirm_child_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmChildDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_child_delete(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        let message = surface_error(&err);
                        error!("event=delete_child module=ui status=error error={message}");
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmChildDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmChildDelete(confirm)),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut query: String, previous: String) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.roster.set_filter(previous);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => return Ok(Mode::Normal),
            KeyCode::Backspace => {
                query.pop();
                self.roster.set_filter(query.clone());
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                query.push(ch);
                self.roster.set_filter(query.clone());
            }
            _ => {}
        }
        Ok(Mode::Searching { query, previous })
    }

    fn save_absence(&mut self, form: &AbsenceForm) -> Result<()> {
        let request = form.to_request()?;
        let child_name = form
            .selected_child()
            .map(|child| child.name.clone())
            .unwrap_or_default();
        let start = request.start_date;
        let id = self
            .client
            .add_absence(request)
            .context("failed to save absence")?;
        info!("event=add_absence module=ui status=ok id={id}");

        self.calendar.select(start);
        self.reload_month();
        self.reload_day();
        self.set_status(format!("Absence recorded for {child_name}."), StatusKind::Info);
        Ok(())
    }

    fn perform_absence_delete(&mut self, confirm: &ConfirmAbsenceDelete) -> Result<()> {
        let deleted = self
            .client
            .delete_absence(confirm.absence.id)
            .context("failed to delete absence")?;
        self.reload_month();
        self.reload_day();
        if deleted {
            self.set_status(
                format!("Deleted absence of {}.", confirm.absence.child_name),
                StatusKind::Info,
            );
        } else {
            self.set_status("Absence was already removed.", StatusKind::Info);
        }
        Ok(())
    }

    fn save_child(&mut self, id: Option<i64>, form: &ChildForm) -> Result<()> {
        let (name, group, birth_date) = form.parse_inputs()?;
        let focus = match id {
            Some(id) => {
                let updated = self
                    .client
                    .update_child(ChildUpdate {
                        id,
                        name: name.clone(),
                        group,
                        birth_date,
                    })
                    .context("failed to update child")?;
                if !updated {
                    warn!("event=update_child module=ui status=missing id={id}");
                }
                self.set_status(format!("Updated {name}."), StatusKind::Info);
                id
            }
            None => {
                let id = self
                    .client
                    .add_child(NewChild {
                        name: name.clone(),
                        group,
                        birth_date,
                    })
                    .context("failed to add child")?;
                self.set_status(format!("Added {name}."), StatusKind::Info);
                id
            }
        };
        self.reload_roster(Some(focus));
        self.reload_month();
        self.reload_day();
        Ok(())
    }

    fn perform_child_delete(&mut self, confirm: &ConfirmChildDelete) -> Result<()> {
        self.client
            .delete_child(confirm.child.id)
            .context("failed to delete child")?;
        self.reload_roster(None);
        self.reload_month();
        self.reload_day();
        self.set_status(format!("Deleted {}.", confirm.child.name), StatusKind::Info);
        Ok(())
    }

    fn import_csv(&mut self) {
        let picked = self.client.open_file_dialog();
        self.needs_full_redraw = true;

        let outcome = match picked {
            Ok(None) => {
                self.set_status("Import cancelled.", StatusKind::Info);
                return;
            }
            Ok(Some(content)) => self
                .client
                .import_children_csv(content)
                .context("failed to import children"),
            Err(err) => Err(anyhow::Error::new(err).context("failed to open file")),
        };

        match outcome {
            Ok(count) => {
                self.reload_roster(None);
                let plural = if count == 1 { "child" } else { "children" };
                self.set_status(format!("Imported {count} {plural}."), StatusKind::Info);
            }
            Err(err) => {
                let message = surface_error(&err);
                error!("event=csv_import module=ui status=error error={message}");
                self.set_status(message, StatusKind::Error);
            }
        }
    }

    fn run_export(&mut self, form: &ExportForm) -> Result<()> {
        let target = form.target()?;
        let report = MonthReport::from_statistics(self.calendar.month, &self.calendar.stats);
        export_month(&target, &report, Local::now().naive_local())
            .with_context(|| format!("failed to export {}", target.display()))?;

        if self.open_after_export {
            if let Err(err) = open_path(&target) {
                warn!(
                    "event=open_export module=ui status=error path={} error={err}",
                    target.display()
                );
            }
        }
        self.set_status(format!("Saved report to {}.", target.display()), StatusKind::Info);
        Ok(())
    }

    fn move_day(&mut self, days: i64) {
        if self.calendar.move_days(days) {
            self.reload_month();
        }
        self.reload_day();
    }

    fn shift_month(&mut self, delta: i32) {
        if self.calendar.shift_month(delta) {
            self.reload_month();
        }
        self.reload_day();
    }

    fn reload_all(&mut self) {
        self.reload_roster(None);
        self.reload_month();
        self.reload_day();
    }

    /// Read failures keep the previous data and only end up in the log.
    fn reload_roster(&mut self, focus_id: Option<i64>) {
        match self.client.list_children() {
            Ok(children) => self.roster.set_children(children, focus_id),
            Err(err) => warn!("event=reload module=ui target=children status=error error={err}"),
        }
    }

    fn reload_month(&mut self) {
        let month = self.calendar.month;
        let stats = self.client.statistics_for_month(month);
        let absences = self.client.list_absences_for_month(month);
        match (stats, absences) {
            (Ok(stats), Ok(absences)) => self.calendar.set_month_data(stats, absences),
            (Err(err), _) | (_, Err(err)) => warn!(
                "event=reload module=ui target=month month={} status=error error={err}",
                month.iso_label()
            ),
        }
    }

    fn reload_day(&mut self) {
        match self.client.list_absences_for_day(self.calendar.selected) {
            Ok(absences) => self.calendar.set_day_absences(absences),
            Err(err) => warn!("event=reload module=ui target=day status=error error={err}"),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TAB_BAR_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_tabs(frame, chunks[0]);
        match self.tab {
            Tab::Calendar => self.draw_calendar(frame, chunks[1]),
            Tab::Roster => self.draw_roster(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::AddingAbsence(form) => self.draw_absence_form(frame, area, form),
            Mode::ConfirmAbsenceDelete(confirm) => {
                let absence = &confirm.absence;
                self.draw_confirm(
                    frame,
                    area,
                    vec![
                        Line::from(format!(
                            "Delete the absence of {} ({})?",
                            absence.child_name,
                            absence.period_label()
                        )),
                        Line::from(absence.reason.clone().unwrap_or_default()),
                    ],
                );
            }
            Mode::Exporting(form) => self.draw_export_form(frame, area, form),
            Mode::AddingChild(form) => self.draw_child_form(frame, area, "Add Child", form),
            Mode::EditingChild { form, .. } => self.draw_child_form(frame, area, "Edit Child", form),
            Mode::ConfirmChildDelete(confirm) => self.draw_confirm(
                frame,
                area,
                vec![
                    Line::from(format!("Delete {}?", confirm.child.display_name())),
                    Line::from("All of their absences are deleted as well."),
                ],
            ),
            Mode::Searching { query, .. } => self.draw_search_bar(frame, chunks[1], query),
            Mode::Normal => {}
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let selected = match self.tab {
            Tab::Calendar => 0,
            Tab::Roster => 1,
        };
        let tabs = Tabs::new(vec!["1 Calendar", "2 Roster"])
            .select(selected)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Kita Absence Tracker"),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_calendar(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(CALENDAR_CELL_WIDTH as u16 * 7 + 2),
                Constraint::Min(20),
            ])
            .split(area);

        let calendar = &self.calendar;
        let mut lines = month_grid_lines(calendar.month, CALENDAR_CELL_WIDTH, |date| {
            let count = calendar.count_for(date);
            let text = if count > 0 {
                format!("{}({count})", date.day())
            } else {
                date.day().to_string()
            };
            let mut style = Style::default();
            if is_weekend(date) {
                style = style.fg(Color::DarkGray);
            }
            if count > 0 {
                style = style.fg(Color::Red).add_modifier(Modifier::BOLD);
            }
            if date == self.today {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            if date == calendar.selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            (text, style)
        });
        // Blank rows between weeks for readability.
        lines = lines
            .into_iter()
            .flat_map(|line| [line, Line::from("")])
            .collect();

        let grid = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("< {} >", calendar.month)),
        );
        frame.render_widget(grid, columns[0]);

        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(SUMMARY_HEIGHT), Constraint::Min(0)])
            .split(columns[1]);

        let summary = Paragraph::new(vec![
            Line::from(format!("Days with absences: {}", calendar.days_with_absences())),
            Line::from(format!("Total absence-days: {}", calendar.total_absence_days())),
            Line::from(format!("Children absent: {}", calendar.children_absent())),
        ])
        .block(Block::default().borders(Borders::ALL).title("Month summary"));
        frame.render_widget(summary, side[0]);

        let title = format!(
            "Absent on {} ({})",
            calendar.selected.format("%a %d.%m.%Y"),
            calendar.day_absences.len()
        );
        let block = Block::default().borders(Borders::ALL).title(title);
        if calendar.day_absences.is_empty() {
            let empty = Paragraph::new(Span::styled(
                "No absences recorded.",
                Style::default().fg(Color::DarkGray),
            ))
            .block(block);
            frame.render_widget(empty, side[1]);
            return;
        }

        let items: Vec<ListItem> = calendar
            .day_absences
            .iter()
            .map(|absence| {
                let mut lines = vec![Line::from(vec![
                    Span::styled(
                        absence.child_name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(if absence.child_group.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", absence.child_group)
                    }),
                    Span::styled(
                        format!("  {}", absence.period_label()),
                        Style::default().fg(Color::Cyan),
                    ),
                ])];
                if let Some(reason) = &absence.reason {
                    lines.push(Line::from(Span::styled(
                        format!("  {reason}"),
                        Style::default().fg(Color::Gray),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("> ");
        let mut list_state = ListState::default();
        list_state.select(Some(calendar.absence_selected));
        frame.render_stateful_widget(list, side[1], &mut list_state);
    }

    fn draw_roster(&self, frame: &mut Frame, area: Rect) {
        let roster = &self.roster;
        let title = if roster.filter.is_empty() {
            format!("Children ({})", roster.children.len())
        } else {
            format!(
                "Children ({} of {}, filter \"{}\")",
                roster.filtered.len(),
                roster.children.len(),
                roster.filter
            )
        };

        let header = Row::new(vec!["Name", "Group", "Birth date"]).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        let rows: Vec<Row> = roster
            .filtered
            .iter()
            .map(|child| {
                Row::new(vec![
                    child.name.clone(),
                    child.group.clone(),
                    child
                        .birth_date
                        .map(|date| date.format("%d.%m.%Y").to_string())
                        .unwrap_or_default(),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(45),
                Constraint::Percentage(30),
                Constraint::Percentage(25),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().fg(Color::Yellow))
        .highlight_symbol("> ");

        let mut state = TableState::default();
        if !roster.filtered.is_empty() {
            state.select(Some(roster.selected));
        }
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let keys: &[(&str, &str)] = match (&self.mode, self.tab) {
            (Mode::AddingAbsence(form), _) => match form.active {
                AbsenceField::Child => &[("[↑↓]", "Child"), ("[Tab]", "Next field"), ("[Enter]", "Save"), ("[Esc]", "Cancel")],
                AbsenceField::Period => &[("[←→/Space]", "Single / Range"), ("[Tab]", "Next field"), ("[Enter]", "Save"), ("[Esc]", "Cancel")],
                AbsenceField::Dates => &[("[Arrows]", "Move"), ("[Space]", "Pick"), ("[PgUp/PgDn]", "Month"), ("[Tab]", "Next field"), ("[Enter]", "Save")],
                AbsenceField::Reason => &[("[Type]", "Reason"), ("[Tab]", "Next field"), ("[Enter]", "Save"), ("[Esc]", "Cancel")],
            },
            (Mode::AddingChild(_) | Mode::EditingChild { .. }, _) => {
                &[("[Tab]", "Accept / Next field"), ("[Enter]", "Save"), ("[Esc]", "Cancel")]
            }
            (Mode::Exporting(_), _) => &[("[Enter]", "Save PDF"), ("[Esc]", "Cancel")],
            (Mode::ConfirmAbsenceDelete(_) | Mode::ConfirmChildDelete(_), _) => {
                &[("[y]", "Delete"), ("[n/Esc]", "Keep")]
            }
            (Mode::Searching { .. }, _) => &[("[Enter]", "Keep filter"), ("[Esc]", "Restore")],
            (Mode::Normal, Tab::Calendar) => &[
                ("[Arrows]", "Day"),
                ("[PgUp/PgDn]", "Month"),
                ("[t]", "Today"),
                ("[a]", "Add"),
                ("[j/k]", "Select"),
                ("[d]", "Delete"),
                ("[x]", "Export"),
                ("[2]", "Roster"),
                ("[q]", "Quit"),
            ],
            (Mode::Normal, Tab::Roster) => &[
                ("[↑↓]", "Select"),
                ("[/]", "Search"),
                ("[+]", "Add"),
                ("[e]", "Edit"),
                ("[-]", "Delete"),
                ("[i]", "Import CSV"),
                ("[1]", "Calendar"),
                ("[q]", "Quit"),
            ],
        };

        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let mut spans = Vec::with_capacity(keys.len() * 2);
        for (key, action) in keys {
            spans.push(Span::styled(key.to_string(), key_style));
            spans.push(Span::raw(format!(" {action}   ")));
        }
        Line::from(spans)
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, query: &str) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {query}"))).block(block.clone());
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_absence_form(&self, frame: &mut Frame, area: Rect, form: &AbsenceForm) {
        let popup_area = centered_rect(70, 85, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Absence").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let active = Style::default().fg(Color::Yellow);
        let label_style = |field: AbsenceField| {
            if form.active == field {
                active
            } else {
                Style::default()
            }
        };

        let child_line = match form.selected_child() {
            Some(child) => Line::from(vec![
                Span::styled("Child: ", label_style(AbsenceField::Child)),
                Span::raw(format!("< {} >", child.display_name())),
            ]),
            None => Line::from(vec![
                Span::styled("Child: ", label_style(AbsenceField::Child)),
                Span::styled(
                    "<no children yet, add them in the roster>",
                    Style::default().fg(Color::Red),
                ),
            ]),
        };

        let choice = |label: &'static str, on: bool| {
            if on {
                Span::styled(format!("[{label}]"), Style::default().add_modifier(Modifier::BOLD))
            } else {
                Span::styled(format!(" {label} "), Style::default().fg(Color::DarkGray))
            }
        };
        let period_line = Line::from(vec![
            Span::styled("Period: ", label_style(AbsenceField::Period)),
            choice("Single day", form.picker.mode == PickerMode::Single),
            Span::raw(" "),
            choice("Range", form.picker.mode == PickerMode::Range),
        ]);

        let picker = &form.picker;
        let dates_active = form.active == AbsenceField::Dates;
        let mut lines = vec![
            child_line,
            period_line,
            Line::from(""),
            Line::from(Span::styled(
                format!("  < {} >", picker.visible),
                label_style(AbsenceField::Dates).add_modifier(Modifier::BOLD),
            )),
        ];
        lines.extend(month_grid_lines(picker.visible, PICKER_CELL_WIDTH, |date| {
            let mut style = Style::default();
            if is_weekend(date) {
                style = style.fg(Color::DarkGray);
            }
            if picker.in_range(date) {
                style = style.bg(Color::Blue).fg(Color::White);
            }
            if date == self.today {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            if date == picker.cursor && dates_active {
                style = style.add_modifier(Modifier::REVERSED);
            }
            (date.day().to_string(), style)
        }));
        lines.push(Line::from(""));
        lines.push(Line::from(format!("Selected: {}", form.period_label())));

        let reason_line_index = lines.len() as u16;
        lines.push(Line::from(vec![
            Span::styled("Reason: ", label_style(AbsenceField::Reason)),
            if form.reason.is_empty() {
                Span::styled("<optional>", Style::default().fg(Color::DarkGray))
            } else {
                Span::raw(form.reason.clone())
            },
        ]));
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else if !form.can_submit() {
            lines.push(Line::from(Span::styled(
                "Choose a child and a complete period to save.",
                Style::default().fg(Color::DarkGray),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);

        if form.active == AbsenceField::Reason {
            let cursor_x = inner.x + "Reason: ".len() as u16 + form.reason.chars().count() as u16;
            frame.set_cursor_position((cursor_x, inner.y + reason_line_index));
        }
    }

    fn draw_child_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &ChildForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Name", ChildField::Name),
            form.build_line("Group", ChildField::Group),
            form.build_line("Birth date", ChildField::BirthDate),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to accept/switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (prefix, row) = match form.active {
            ChildField::Name => ("Name: ", 0),
            ChildField::Group => ("Group: ", 1),
            ChildField::BirthDate => ("Birth date: ", 2),
        };
        let cursor_x = inner.x + prefix.len() as u16 + form.value_len(form.active) as u16;
        frame.set_cursor_position((cursor_x, inner.y + row));
    }

    fn draw_export_form(&self, frame: &mut Frame, area: Rect, form: &ExportForm) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("Export {}", self.calendar.month))
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(vec![
                Span::raw("Save to: "),
                Span::styled(form.path.clone(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(""),
        ];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to write the PDF • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

        let cursor_x = inner.x + "Save to: ".len() as u16 + form.path.chars().count() as u16;
        if cursor_x < inner.x + inner.width {
            frame.set_cursor_position((cursor_x, inner.y));
        }
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, mut lines: Vec<Line<'static>>) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}
