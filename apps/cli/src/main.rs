//! partscatalog CLI: classifies a package registry dump into web and native
//! component catalogs, enriches them with remote metadata and exports
//! search-index batches.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}