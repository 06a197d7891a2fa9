//! Cue CLI - drive annotation synchronization from the terminal

mod cli;
mod commands;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::common::{resolve_db_path, resolve_remote_config, GlobalOptions};
use crate::commands::config::{build_update, run_config};
use crate::commands::import::run_import;
use crate::commands::show::run_show;
use crate::commands::status::run_status;
use crate::commands::sync::{run_pull, run_push, run_resolve, run_sync};
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let options = GlobalOptions {
        db_path: resolve_db_path(cli.db_path),
        remote: resolve_remote_config(cli.config_file.as_deref(), cli.api_base_url, cli.token)?,
    };

    match cli.command {
        Commands::Sync { video } => run_sync(&video, &options).await?,
        Commands::Push { video } => run_push(&video, &options).await?,
        Commands::Pull { video } => run_pull(&video, &options).await?,
        Commands::Resolve { video, policy } => {
            run_resolve(&video, policy.into(), &options).await?;
        }
        Commands::Import { video, file } => run_import(&video, &file, &options).await?,
        Commands::Show { video, json } => run_show(&video, json, &options).await?,
        Commands::Status { video, json } => run_status(&video, json, &options).await?,
        Commands::Config {
            auto_sync,
            interval,
            policy,
            retry_count,
        } => {
            run_config(build_update(auto_sync, interval, policy, retry_count), &options).await?;
        }
        Commands::Watch { video } => run_watch(video.as_deref(), &options).await?,
    }

    Ok(())
}

fn init_logging() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "cue=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
