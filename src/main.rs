#[tokio::main]
async fn main() -> anyhow::Result<()> {
    articole::app::run().await
}
