use clap::Parser;
use uhi_pipeline::cli::{run, Cli};
use uhi_pipeline::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
