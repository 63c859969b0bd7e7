mod config;
mod logging;
mod ports;
mod services;
mod spotify_rs;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context, eyre::eyre};

use crate::{
    config::Config,
    logging::init_tracing,
    ports::credentials::{AccountCredentials, AccountRole, CredentialSource},
    services::{
        library_sync::{
            LibraryId, SyncDirection, SyncEngine, SyncFrequency, SyncRequest, SyncSummary,
            TransferOutcome,
        },
        spotify::{client::SpotifyHttpAdapter, libraries::list_libraries},
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "LIBRARY_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Tracing filter directive, e.g. `info` or `library_sync=debug`
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// OTLP gRPC endpoint to export spans to
    #[arg(long, global = true, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    /// Access token of the primary account
    #[arg(long, global = true, env = "SPOTIFY_PRIMARY_TOKEN", hide_env_values = true)]
    primary_token: Option<String>,

    /// Access token of the secondary account
    #[arg(long, global = true, env = "SPOTIFY_SECONDARY_TOKEN", hide_env_values = true)]
    secondary_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy selected libraries between the two accounts
    Sync {
        /// Library selected on the primary account (`liked_songs` or a playlist id)
        #[arg(short, long = "library")]
        libraries: Vec<String>,

        /// Library selected on the secondary account
        #[arg(short, long = "secondary-library")]
        secondary_libraries: Vec<String>,

        #[arg(short, long, value_enum, default_value_t = SyncDirection::OneWay)]
        direction: SyncDirection,

        /// Scheduling hint, recorded but not acted on
        #[arg(short, long, value_enum, default_value_t = SyncFrequency::Manual)]
        frequency: SyncFrequency,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the libraries of one account
    Libraries {
        #[arg(short, long, value_enum, default_value_t = AccountRole::Primary)]
        account: AccountRole,

        /// Print the libraries as JSON
        #[arg(long)]
        json: bool,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

fn print_summary(summary: &SyncSummary) {
    println!(
        "Synced {} libraries ({}), {} items transferred in {}",
        summary.library_count,
        summary.direction,
        summary.total_items_transferred,
        humantime::format_duration(
            (summary.finished_at - summary.started_at)
                .to_std()
                .unwrap_or_default()
        ),
    );
    for report in &summary.libraries {
        let detail = match &report.outcome {
            TransferOutcome::Transferred(stats) if stats.failed_chunks.is_empty() => {
                format!("{} of {} items", stats.transferred, stats.eligible)
            }
            TransferOutcome::Transferred(stats) => format!(
                "{} of {} items, {} chunks failed",
                stats.transferred,
                stats.eligible,
                stats.failed_chunks.len()
            ),
            TransferOutcome::Unsupported { direction } => format!("skipped, {} unsupported", direction),
            TransferOutcome::Failed { stage, error } => {
                format!("failed during {:?}: {}", stage, error.message)
            }
        };
        println!("  [{}] {}: {}", report.source, report.library, detail);
    }
}

async fn run(command: Commands, credentials: AccountCredentials, config: Config) -> Result<()> {
    let api = SpotifyHttpAdapter::new(
        config.api_base_url()?,
        config.request_timeout()?,
        config.requests_per_second()?,
    );
    let settings = config.sync_settings()?;

    match command {
        Commands::Sync {
            libraries,
            secondary_libraries,
            direction,
            frequency,
            json,
        } => {
            let request = SyncRequest::from_account_selections(
                libraries.iter().map(|raw| LibraryId::parse(raw)).collect(),
                secondary_libraries
                    .iter()
                    .map(|raw| LibraryId::parse(raw))
                    .collect(),
                config.sync.secondary_selection_source,
                direction,
                frequency,
            );
            tracing::info!(
                libraries = request.selections.len(),
                direction = %direction,
                "Starting sync"
            );

            let summary = SyncEngine::new(api, settings)
                .sync(&credentials, &request)
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
            let failed = summary.failed_libraries().count();
            if failed > 0 {
                tracing::warn!(failed, "Some libraries failed to sync");
            }
        }
        Commands::Libraries { account, json } => {
            let credential = credentials
                .credential(account)
                .ok_or_else(|| eyre!("No access token for the {} account", account))?;
            let libraries = list_libraries(&api, &credential, settings.page_size)
                .await
                .wrap_err_with(|| format!("Failed to list libraries of the {} account", account))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&libraries)?);
            } else {
                for library in &libraries {
                    println!(
                        "{}\t{}\t{} tracks",
                        library.id, library.name, library.total_tracks
                    );
                }
            }
        }
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                let path = Config::create_default()?;
                tracing::info!("Default config available at {}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
    }

    Ok(())
}

async fn load_and_run(args: Args) -> Result<()> {
    tracing::debug!("Loading configuration");
    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load library-sync config")?;

    let credentials = AccountCredentials::new(args.primary_token, args.secondary_token);
    run(args.command, credentials, config).await
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let telemetry = init_tracing(
        "library-sync",
        args.otlp_endpoint.as_deref(),
        &args.log_level,
    )?;

    let result = load_and_run(args).await;

    telemetry.shutdown();
    result
}
