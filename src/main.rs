use clap::Parser;
use smoke_signal::cli::{run, Cli};
use smoke_signal::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
