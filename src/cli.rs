use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Kita absence tracker: children, groups and absences on a monthly calendar
#[derive(Parser, Debug)]
#[command(name = "kita")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the database file and the logs
    #[arg(long, global = true, env = "KITA_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to config.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one bridge command given as JSON and print the JSON answer
    Exec {
        /// Request such as '{"command":"list-children"}'; `-` reads stdin
        #[arg(value_name = "JSON")]
        request: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn exec_takes_global_flags_after_the_subcommand() {
        let cli = Cli::parse_from([
            "kita",
            "exec",
            r#"{"command":"list-children"}"#,
            "--data-dir",
            "/tmp/kita",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/kita")));
        assert!(matches!(cli.command, Some(Commands::Exec { .. })));
    }
}
