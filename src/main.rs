use clap::Parser;
use team_membership::cli::{self, Cli};
use team_membership::infrastructure::logging::init_logging;
use team_membership::{AppConfig, create_services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let services = create_services(&config).await?;

    cli::run(cli.command, &services).await
}
