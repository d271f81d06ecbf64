use crate::{context, repository::Repository, rest, storage};
use anyhow::{Context, Result};

pub fn init_data_dir(ctx: &context::Context) -> Result<()> {
    std::fs::create_dir_all(&ctx.data_dir)?;
    Ok(())
}

pub fn init_storage(ctx: &context::Context) -> Result<storage::SqliteStorage> {
    let sqlite = storage::SqliteStorage::new(ctx.db_path(), ctx.relation());
    if ctx.reset {
        sqlite.reset_all().context("resetting storage")?;
    }
    sqlite.init().context("initializing storage")?;
    Ok(sqlite)
}

pub fn build_state(
    ctx: &context::Context,
    repo: Repository<storage::SqliteStorage>,
) -> rest::AppState<storage::SqliteStorage> {
    rest::AppState::new(repo, ctx.export_dir.clone())
}
