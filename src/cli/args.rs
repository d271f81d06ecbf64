use clap::Parser;
use std::env;

use crate::{cli::command::Command, storage::OnDelete};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "HTTP API for articles and their references",
    long_about = "Serves CRUD endpoints over articles (Articol) and the references attached to them, backed by SQLite.",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[arg(
        long,
        default_value_t = false,
        help = "Reset all persisted state (delete the SQLite database) before starting"
    )]
    pub reset: bool,

    #[arg(
        long,
        env = "ARTICOLE_DATA_DIR",
        default_value = ".articole/",
        value_name = "DIR",
        help = "Directory to store persistent data"
    )]
    pub data_dir: String,

    #[arg(
        long,
        env = "ARTICOLE_EXPORT_DIR",
        default_value = "./exported",
        value_name = "DIR",
        help = "Directory the JSON export is written to"
    )]
    pub export_dir: String,

    #[arg(
        long = "api-listen",
        env = "ARTICOLE_API_LISTEN",
        value_name = "ADDR",
        default_value = "127.0.0.1:3001",
        help = "REST API listen address (host:port)"
    )]
    pub api_listen: std::net::SocketAddr,

    #[arg(
        long = "cors-origin",
        env = "ARTICOLE_CORS_ORIGIN",
        value_name = "URL",
        default_value = "http://localhost:3000",
        help = "Origin allowed to call the API from a browser"
    )]
    pub cors_origin: String,

    #[arg(
        long = "on-delete",
        env = "ARTICOLE_ON_DELETE",
        value_enum,
        default_value_t = OnDelete::Cascade,
        help = "What deleting an article does to its references"
    )]
    pub on_delete: OnDelete,

    #[arg(
        long = "log-file",
        env = "ARTICOLE_LOG_FILE",
        value_name = "PATH",
        help = "Write logs to PATH (in addition to stderr)"
    )]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub cmd: Option<Command>,
}

pub fn parse() -> Cli {
    let dotenv_path = env::var("DOTENV_PATH").unwrap_or(".env".into());
    dotenvy::from_filename(&dotenv_path).ok();

    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cli = Cli::try_parse_from(["articole"]).unwrap();
        assert_eq!(cli.api_listen.to_string(), "127.0.0.1:3001");
        assert_eq!(cli.cors_origin, "http://localhost:3000");
        assert_eq!(cli.export_dir, "./exported");
        assert_eq!(cli.on_delete, OnDelete::Cascade);
        assert!(!cli.reset);
        assert!(cli.cmd.is_none());
    }

    #[test]
    fn parses_restrict_and_subcommand() {
        let cli = Cli::try_parse_from(["articole", "--on-delete", "restrict", "export"]).unwrap();
        assert_eq!(cli.on_delete, OnDelete::Restrict);
        assert!(matches!(cli.cmd, Some(Command::Export)));
    }
}
