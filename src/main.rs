use anyhow::Result;
use dmrelay::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
