mod api;
mod app;
mod backup;
mod cli;
mod config;
mod error;
mod storage;
mod store;
mod tracking;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Commands, LicenseCommand};
use crate::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search { query } => cli::commands::search(query).await?,
        Commands::Track { id } => cli::commands::track(id).await?,
        Commands::Refresh { id } => cli::commands::refresh(id).await?,
        Commands::Remove { id } => cli::commands::remove(id).await?,
        Commands::Select { id } => cli::commands::select(id).await?,
        Commands::List { filter, favorites } => cli::commands::list(filter, favorites).await?,
        Commands::Show { id } => cli::commands::show(id).await?,
        Commands::Watch {
            series,
            season,
            episode,
            unwatch,
        } => cli::commands::watch(series, season, episode, unwatch).await?,
        Commands::Season(args) => cli::commands::season(args).await?,
        Commands::Favorite { id } => cli::commands::favorite(id).await?,
        Commands::Export { dir } => cli::commands::export(dir).await?,
        Commands::Import { file } => cli::commands::import(file).await?,
        Commands::License { action } => match action {
            LicenseCommand::Activate { key } => cli::commands::license_activate(key).await?,
            LicenseCommand::Check { key } => cli::commands::license_check(key).await?,
        },
        Commands::Config { show, set, reset } => {
            cli::commands::config(show, set, reset).await?;
        }
    }

    Ok(())
}
