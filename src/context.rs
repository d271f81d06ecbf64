use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context as AnyhowContext, Result};
use axum::http::HeaderValue;

use crate::storage::{OnDelete, Relation};

#[derive(Clone, Debug)]
pub struct Context {
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
    pub api_listen: SocketAddr,
    pub cors_origin: HeaderValue,
    pub on_delete: OnDelete,
    pub log_file: Option<PathBuf>,
    pub reset: bool,
}

impl Context {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let cors_origin = HeaderValue::from_str(&cli.cors_origin)
            .with_context(|| format!("invalid CORS origin {:?}", cli.cors_origin))?;

        Ok(Self {
            data_dir: PathBuf::from(&cli.data_dir),
            export_dir: PathBuf::from(&cli.export_dir),
            api_listen: cli.api_listen,
            cors_origin,
            on_delete: cli.on_delete,
            log_file: cli.log_file.as_ref().map(PathBuf::from),
            reset: cli.reset,
        })
    }

    pub fn relation(&self) -> Relation {
        Relation::articol_references(self.on_delete)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("articole.sqlite")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn builds_from_cli() {
        let cli = crate::cli::Cli::try_parse_from([
            "articole",
            "--data-dir",
            "/tmp/articole-data",
            "--on-delete",
            "restrict",
        ])
        .unwrap();
        let ctx = Context::from_cli(&cli).unwrap();
        assert_eq!(ctx.db_path(), PathBuf::from("/tmp/articole-data/articole.sqlite"));
        assert_eq!(ctx.relation().on_delete, OnDelete::Restrict);
        assert_eq!(ctx.cors_origin, "http://localhost:3000");
    }

    #[test]
    fn rejects_unusable_origin() {
        let cli =
            crate::cli::Cli::try_parse_from(["articole", "--cors-origin", "bad\norigin"]).unwrap();
        assert!(Context::from_cli(&cli).is_err());
    }
}
