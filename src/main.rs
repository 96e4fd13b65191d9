//! Binary entry point: resolve configuration, start logging, open the store
//! and either run a single bridge command or the interactive TUI.

mod cli;

use std::io::Read;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, info};

use kita_absence_tracker::bridge::{Backend, Client, NoDialog};
use kita_absence_tracker::config::{default_config_path, load_config, AppConfig};
use kita_absence_tracker::db::Store;
use kita_absence_tracker::logging::init_logging;
use kita_absence_tracker::ui::{run_app, App, TerminalFileDialog};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    init_logging(&config.logging.level, &config.log_dir()?).map_err(|err| anyhow!(err))?;

    let db_path = config.db_path()?;
    let store = Store::open(&db_path).map_err(|err| {
        error!(
            "event=store_open module=main status=error path={} error={err}",
            db_path.display()
        );
        err
    });
    let store = store.with_context(|| format!("failed to open {}", db_path.display()))?;

    match cli.command {
        Some(Commands::Exec { request }) => run_exec(store, &request),
        None => run_tui(store, &config),
    }
}

/// Config file first, then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = load_config(&path)?;
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    Ok(config)
}

fn run_exec(store: Store, request: &str) -> Result<()> {
    let raw = if request == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read request from stdin")?;
        buffer
    } else {
        request.to_string()
    };

    let mut backend = Backend::new(store, Box::new(NoDialog));
    println!("{}", backend.dispatch_json(&raw));
    backend.shutdown()?;
    Ok(())
}

fn run_tui(store: Store, config: &AppConfig) -> Result<()> {
    let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let backend = Backend::new(store, Box::new(TerminalFileDialog::new(base_dir)));
    let mut app = App::new(Client::new(backend), config);

    let outcome = run_app(&mut app);
    let mut client = app.into_client();
    client.backend_mut().shutdown()?;
    info!("event=app_exit module=main status=ok");
    outcome
}
