// Copyright 2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use lectern::acquire::chromium::{find_chromium, ChromiumBrowser};
use lectern::acquire::fetch::FetchSession;
use lectern::acquire::session::PortalSession;
use lectern::collect::SliceRange;
use lectern::config::Config;
use lectern::notify::{Notifier, WebhookNotifier};
use lectern::store::{SnapshotStore, SqliteStore};
use lectern::worker::Worker;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "lectern",
    about = "Lectern — course portal snapshot watcher",
    version,
    after_help = "Configuration comes from LECTERN_* environment variables; run 'lectern doctor' to check it."
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the fetch-path pipeline: fetch, diff, notify, persist
    Run {
        /// First subject index to process (inclusive)
        #[arg(long)]
        start: Option<usize>,
        /// Last subject index to process (exclusive)
        #[arg(long)]
        end: Option<usize>,
    },
    /// Run the browser-path acquisition once (collects pages into the audit trail)
    Scrape,
    /// List stored subject snapshot keys
    Snapshots,
    /// Check Chromium discovery and configuration
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Run { start, end } => run_pipeline(start, end).await,
        Commands::Scrape => run_scrape().await,
        Commands::Snapshots => list_snapshots(),
        Commands::Doctor => doctor(),
    }
}

async fn run_pipeline(start: Option<usize>, end: Option<usize>) -> Result<()> {
    let config = Config::from_env()?;
    let run_id = uuid::Uuid::new_v4();
    info!(%run_id, "starting run");

    let store = Arc::new(SqliteStore::open(&config.db_path)?);
    let notifier = Arc::new(WebhookNotifier::new(config.webhook_url.clone()));
    let fetcher = Arc::new(FetchSession::new(config)?);

    let range = match (start, end) {
        (None, None) => None,
        (start, end) => Some(SliceRange::new(start.unwrap_or(0), end.unwrap_or(usize::MAX))),
    };

    let worker = Worker::new(fetcher, store, Arc::clone(&notifier) as Arc<dyn Notifier>);
    // Batch-level catch: anything that escaped per-subject handling is
    // logged and reported once, then surfaced to the caller.
    match worker.run(range).await {
        Ok(_report) => Ok(()),
        Err(e) => {
            error!("run failed: {e:#}");
            if let Err(notify_err) = notifier.error(&format!("run failed: {e:#}")).await {
                error!("error notification failed: {notify_err}");
            }
            Err(e)
        }
    }
}

async fn run_scrape() -> Result<()> {
    let config = Config::from_env()?;
    let store = SqliteStore::open(&config.db_path)?;

    let browser = Arc::new(ChromiumBrowser::launch().await?);
    let mut session = PortalSession::new(browser, config);

    let result = session.run(&store).await;
    // Reset the session whether or not the run succeeded.
    if let Err(e) = session.close().await {
        error!("session close failed: {e}");
    }

    let meetings = result?;
    info!(count = meetings.len(), "scrape finished");
    Ok(())
}

fn list_snapshots() -> Result<()> {
    let config = Config::from_env()?;
    let store = SqliteStore::open(&config.db_path)?;
    for key in store.list("subject_")? {
        println!("{key}");
    }
    Ok(())
}

fn doctor() -> Result<()> {
    match find_chromium() {
        Some(path) => println!("chromium: {}", path.display()),
        None => println!("chromium: NOT FOUND (set LECTERN_CHROMIUM_PATH)"),
    }
    match Config::from_env() {
        Ok(config) => {
            println!("config: ok");
            println!("portal: {}", config.portal_base_url);
            println!("learn:  {}", config.learn_base_url);
            println!("db:     {}", config.db_path.display());
        }
        Err(e) => println!("config: {e}"),
    }
    Ok(())
}
