//! search-sync: keeps a search index in sync with a content store.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use search_sync::server::{build_router, AppState};
use search_sync::{Dependencies, LogFormat, Settings, SyncError};
use search_sync_pipeline::SyncOptions;

#[derive(Parser)]
#[command(name = "search-sync")]
#[command(about = "Keeps a search index in sync with a content store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server (default)
    Serve,
    /// Index every published document of the configured types
    Reindex {
        /// Replace each index's contents instead of updating them
        #[arg(long)]
        replace_all: bool,

        /// Restrict the reindex to these types
        #[arg(long, value_delimiter = ',')]
        types: Option<Vec<String>>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(LogFormat::default());
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(settings.log_format);

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(settings).await,
        Commands::Reindex { replace_all, types } => reindex(settings, replace_all, types).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "search-sync failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn serve(settings: Settings) -> Result<(), SyncError> {
    let dependencies = Dependencies::new(&settings).await?;
    let state = AppState::new(dependencies.orchestrator, settings.webhook_secret.as_deref());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.listen_addr).await?;
    info!(addr = %settings.listen_addr, "search-sync listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("search-sync stopped");
    Ok(())
}

async fn reindex(
    settings: Settings,
    replace_all: bool,
    types: Option<Vec<String>>,
) -> Result<(), SyncError> {
    let dependencies = Dependencies::new(&settings).await?;

    let mut options = SyncOptions::default().with_replace_all(replace_all);
    if let Some(types) = types {
        options = options.with_type_filter(types);
    }

    let outcome = dependencies.orchestrator.reindex(&options).await?;
    for index in &outcome.indices {
        info!(
            index = %index.index,
            saved = index.saved_ids.len(),
            deleted = index.deleted_ids.len(),
            replaced = index.replaced,
            "Reindexed"
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
