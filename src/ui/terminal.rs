use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor::Show;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use dialoguer::Input;
use log::info;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::bridge::{is_csv_path, FileDialog};
use crate::error::{BridgeError, BridgeResult};

use super::app::App;

/// Spin up the terminal backend, enter the draw loop, and keep processing input
/// until the user quits.
pub fn run_app(app: &mut App) -> Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;

    let result = loop {
        if app.take_redraw_request() {
            terminal.clear().context("failed to clear terminal")?;
        }
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        if event::poll(Duration::from_millis(250)).context("event polling failed")? {
            if let Event::Key(key_event) = event::read().context("failed to read event")? {
                if key_event.kind == KeyEventKind::Press {
                    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
                        match key_event.code {
                            KeyCode::Char('c') => break Ok(()),
                            KeyCode::Char('r') => {
                                app.handle_ctrl_r()?;
                                continue;
                            }
                            KeyCode::Char('l') => {
                                terminal.clear().context("failed to clear terminal")?;
                                continue;
                            }
                            _ => {}
                        }
                    }

                    if app.handle_key(key_event.code)? {
                        break Ok(());
                    }
                }
            }
        }
    };

    cleanup_terminal(&mut terminal)?;
    result
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal
        .show_cursor()
        .context("failed to restore cursor visibility")
}

/// Asks for a CSV path on the plain terminal. The TUI is suspended while the
/// prompt is open and restored afterwards.
pub struct TerminalFileDialog {
    base_dir: PathBuf,
}

impl TerminalFileDialog {
    /// Relative answers are resolved against `base_dir`.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }
}

impl FileDialog for TerminalFileDialog {
    fn pick_csv_file(&mut self) -> BridgeResult<Option<PathBuf>> {
        suspend_tui().map_err(dialog_error)?;
        let picked = prompt_for_csv(&self.base_dir);
        resume_tui().map_err(dialog_error)?;

        if let Ok(Some(path)) = &picked {
            info!(
                "event=file_dialog module=ui status=ok path={}",
                path.display()
            );
        }
        picked
    }
}

fn prompt_for_csv(base_dir: &Path) -> BridgeResult<Option<PathBuf>> {
    println!("Import children from a CSV file (header line, then name,group,birth date).");
    println!(
        "Relative paths start at {}. Leave empty to cancel.",
        base_dir.display()
    );

    let validation_base = base_dir.to_path_buf();
    let input: String = Input::new()
        .with_prompt("CSV file")
        .allow_empty(true)
        .validate_with(move |raw: &String| -> Result<(), String> {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(());
            }
            let path = resolve_path(&validation_base, raw);
            if !is_csv_path(&path) {
                Err("only .csv files can be imported".to_string())
            } else if !path.is_file() {
                Err(format!("{} does not exist", path.display()))
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(|err| BridgeError::Dialog(err.to_string()))?;

    let raw = input.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Ok(Some(resolve_path(base_dir, raw)))
}

fn resolve_path(base_dir: &Path, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

fn suspend_tui() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, Show)
}

fn resume_tui() -> io::Result<()> {
    execute!(io::stdout(), EnterAlternateScreen)?;
    enable_raw_mode()
}

fn dialog_error(err: io::Error) -> BridgeError {
    BridgeError::Dialog(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_answers_resolve_against_the_base_dir() {
        let base = Path::new("/home/kita");
        assert_eq!(
            resolve_path(base, "lists/kids.csv"),
            PathBuf::from("/home/kita/lists/kids.csv")
        );
        assert_eq!(resolve_path(base, "/tmp/kids.csv"), PathBuf::from("/tmp/kids.csv"));
    }
}
