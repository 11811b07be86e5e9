//! sootcache - offline cache worker
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use sootcache::cli::args::LogFormat;
use sootcache::cli::{commands, Cli, Commands};
use sootcache::config::ConfigManager;
use sootcache::error::SootResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, format: LogFormat) {
    // 0 = warn, 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("sootcache=warn"),
        1 => EnvFilter::new("sootcache=info"),
        _ => EnvFilter::new("sootcache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn run() -> SootResult<()> {
    let cli = Cli::parse();

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = manager.load().await?;

    let log_format = cli
        .log_format
        .unwrap_or_else(|| LogFormat::from_config(&config.general.log_format));
    init_logging(cli.verbose, log_format);

    let state_dir = cli
        .state_dir
        .clone()
        .unwrap_or_else(ConfigManager::default_state_dir);
    debug!("Config {}, state {}", manager.path().display(), state_dir.display());

    match cli.command {
        Commands::Install(args) => commands::install(args, &config, &state_dir).await,
        Commands::Activate => commands::activate(&config, &state_dir).await,
        Commands::Fetch(args) => commands::fetch(args, &config, &state_dir).await,
        Commands::Message(args) => commands::message(args, &config, &state_dir).await,
        Commands::Sync { tag } => commands::sync(tag, &config, &state_dir).await,
        Commands::Push { data } => commands::push(data, &config, &state_dir).await,
        Commands::Click { action } => commands::click(action, &config, &state_dir).await,
        Commands::Status(args) => commands::status(args, &config, &state_dir).await,
        Commands::Config(args) => commands::config(args, &config, &manager).await,
    }
}
