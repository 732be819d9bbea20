mod cli;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};
use wayfinder::shell::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let settings = Settings::from_env()?.with_data_dir(args.data_dir.clone());

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    tracing::debug!(data_dir = %settings.data_dir.display(), "settings loaded");
    cli::run(args.command, &settings).await
}
