//! Ledgerflow main entry point

use anyhow::Context;
use clap::Parser;
use ledgerflow_api::start_server;
use ledgerflow_config::Config;
use ledgerflow_core::store::init_pool;
use ledgerflow_core::{FilterFlow, InMemoryReportCache, PgEntryStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "ledgerflow")]
#[command(author = "Ledgerflow Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Entry filtering, field options and report downloads for a bookkeeping backend", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration template and exit
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let loaded = Config::load(args.config.clone());
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            let details = e.to_details();
            log::error!("Failed to load configuration: {}", details.message);
            for suggestion in &details.suggestions {
                log::error!("  hint: {}", suggestion);
            }
            return Err(e).with_context(|| format!("loading {}", args.config.display()));
        }
    };
    log::info!(
        "Config loaded: bind={}, cache ttl={}ms, pool max={}",
        config.bind_addr(),
        config.cache.ttl_ms,
        config.database.max_connections
    );

    let pool = init_pool(&config.database)
        .await
        .context("connecting to the entry database")?;
    log::info!("Database pool ready");

    let store = Arc::new(PgEntryStore::new(pool));
    let cache = Arc::new(InMemoryReportCache::from_config(&config.cache));
    let flow = Arc::new(FilterFlow::new(store, cache));

    start_server(config, flow).await.context("serving HTTP")?;
    Ok(())
}
