use crate::cli::Command;
use crate::context;
use crate::repository::Repository;
use crate::storage::Storage;

impl Command {
    pub fn run<S: Storage>(&self, ctx: &context::Context, repo: &Repository<S>) -> anyhow::Result<()> {
        match self {
            Command::CreateSchema => {
                repo.recreate_schema()?;
                println!("Database created with the models.");
            }
            Command::Export => {
                let path = repo.export_full(&ctx.export_dir)?;
                println!("{}", path.display());
            }
        }
        Ok(())
    }
}
