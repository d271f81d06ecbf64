mod wiring;

use crate::{cli, context, repository::Repository, rest, storage::SqliteStorage};
use anyhow::{Context as AnyhowContext, Result};
use tokio_util::sync::CancellationToken;

pub struct App {
    pub ctx: context::Context,
    pub repo: Repository<SqliteStorage>,
}

impl App {
    pub fn from_cli() -> Result<(Self, cli::Cli)> {
        let cli = crate::cli::parse();
        let ctx = context::Context::from_cli(&cli)?;

        crate::tracing::init(ctx.log_file.as_deref());
        log::info!("🚀 Starting articole");
        log::info!("📂 Data dir: {}", ctx.data_dir.to_string_lossy());
        log::info!("📦 Export dir: {}", ctx.export_dir.to_string_lossy());
        log::info!("🔗 Relation on-delete: {}", ctx.on_delete);

        wiring::init_data_dir(&ctx).context("initializing data dir")?;
        let storage = wiring::init_storage(&ctx)?;

        Ok((
            Self {
                ctx,
                repo: Repository::new(storage),
            },
            cli,
        ))
    }
}

pub async fn run_daemon(app: App) -> Result<()> {
    log::info!("🌐 REST API: http://{}", app.ctx.api_listen);
    log::info!("🌍 CORS origin: {:?}", app.ctx.cors_origin);
    if let Some(path) = app.ctx.log_file.as_deref() {
        log::info!("📝 Log file: {}", path.to_string_lossy());
    }

    let shutdown = CancellationToken::new();

    let addr = app.ctx.api_listen;
    let origin = app.ctx.cors_origin.clone();
    let state = wiring::build_state(&app.ctx, app.repo);
    let rest_shutdown = shutdown.clone();

    let mut rest_handle =
        tokio::spawn(async move { rest::serve(addr, state, origin, rest_shutdown).await });

    let mut fatal_error: Option<anyhow::Error> = None;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("🧨 Ctrl-C received, shutting down");
        }
        result = &mut rest_handle => {
            log::error!("REST task exited unexpectedly");
            match result {
                Ok(Err(e)) => fatal_error = Some(e),
                Err(e) => fatal_error = Some(e.into()),
                Ok(Ok(())) => {}
            }
        }
    }

    shutdown.cancel();
    // a JoinHandle that already completed inside select! must not be polled again
    if !rest_handle.is_finished() {
        match rest_handle.await {
            Ok(Err(e)) => {
                fatal_error.get_or_insert(e);
            }
            Err(e) => {
                fatal_error.get_or_insert(e.into());
            }
            Ok(Ok(())) => {}
        }
    }

    if let Some(e) = fatal_error {
        log::error!("REST server error: {:#}", e);
        return Err(e);
    }

    log::info!("✅ Shutdown complete");
    Ok(())
}

pub async fn run() -> Result<()> {
    let (app, cli) = App::from_cli()?;

    if let Some(cmd) = &cli.cmd {
        // one-shot command mode
        cmd.run(&app.ctx, &app.repo)?;
        return Ok(());
    }

    run_daemon(app).await
}
