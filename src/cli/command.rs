use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(
        about = "Drop and recreate all tables",
        long_about = "Destroys every article and reference and recreates an empty schema. Meant for development seeding."
    )]
    CreateSchema,
    #[command(
        about = "Write the full article/reference export",
        long_about = "Serializes every article with its references to articole_full.json in the export directory."
    )]
    Export,
}
