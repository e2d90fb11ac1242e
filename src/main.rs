use clap::Parser;
use prism_extractor::cli::{run, Cli};
use prism_extractor::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
