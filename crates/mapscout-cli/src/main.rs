mod collect;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mapscout")]
#[command(about = "Harvest business listings from map search results into CSV files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect places for a single search query
    Collect {
        /// Search text, e.g. "coffee shops in Austin TX"
        #[arg(long)]
        query: String,

        /// City label stored on every place and used for the default file key
        #[arg(long)]
        city: String,

        /// Maximum number of distinct places to collect
        #[arg(long, default_value_t = 5, value_parser = parse_limit)]
        limit: usize,

        /// Output file key (defaults to a slug of the city)
        #[arg(long)]
        file_key: Option<String>,

        /// Skip visiting websites to look for an email address
        #[arg(long)]
        no_email: bool,

        /// Print the collected places as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run every job in the jobs file
    Batch {
        /// Jobs file (defaults to `MAPSCOUT_JOBS_PATH`)
        #[arg(long)]
        jobs: Option<PathBuf>,

        /// List the jobs without launching a browser
        #[arg(long)]
        dry_run: bool,
    },
}

fn parse_limit(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("limit must be at least 1".to_string()),
        Ok(limit) => Ok(limit),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = mapscout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    match cli.command {
        Commands::Collect {
            query,
            city,
            limit,
            file_key,
            no_email,
            json,
        } => {
            let job = mapscout_core::Job {
                city,
                query,
                limit,
                file_key,
            };
            collect::run_collect(&config, &job, !no_email, json, &cancel).await
        }
        Commands::Batch { jobs, dry_run } => {
            collect::run_batch(&config, jobs.as_deref(), dry_run, &cancel).await
        }
    }
}

/// Cancels `token` on Ctrl-C or SIGTERM so the running collection stops
/// and its partial results are still written.
async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping after the current step");
    token.cancel();
}
