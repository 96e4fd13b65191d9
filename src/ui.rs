//! Ratatui front-end: a calendar tab and a roster tab over the command bridge.

mod app;
mod date_picker;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::{run_app, TerminalFileDialog};
