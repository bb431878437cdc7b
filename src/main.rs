use clap::Parser;
use confhub_rs::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = cli::load_and_merge_config(&cli)?;
    if !cli.is_dry_run() {
        cli::init_logger_from_settings(&settings)?;
    }

    cli::execute_command(&cli, settings).await
}
