//! SorceryBot - Main Entry Point
//!
//! Loads the card catalog, pre-warms TCGplayer prices and serves card
//! commands. The messaging gateway is external; this binary drives the
//! command table from stdin so the core can be run on its own.

use anyhow::Result;
use clap::Parser;
use sorcery_bot::config::load_config;
use sorcery_bot::BotCore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides `settings.log_level`
    #[arg(long)]
    log_level: Option<String>,

    /// Override the catalog file from the configuration
    #[arg(long, env = "CATALOG_PATH")]
    catalog: Option<String>,

    /// Start without fetching all prices up front
    #[arg(long)]
    skip_prewarm: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let mut config = load_config(Some(args.config.as_str()))?;
    if let Some(path) = args.catalog {
        config.catalog.path = path;
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.settings.max_level(args.log_level.as_deref()))
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting SorceryBot");
    info!("Configuration file: {}", args.config);

    // Catalog failures are fatal; pricing failures only degrade the start
    let core = match BotCore::start(&config, !args.skip_prewarm).await {
        Ok(core) => core,
        Err(e) => {
            error!("Startup failed: {}", e);
            return Err(e.into());
        }
    };

    if let Some(report) = &core.prewarm {
        if report.degraded {
            warn!("Started in degraded mode: {}", report.error.as_deref().unwrap_or("unknown"));
        }
    }

    let router = core.router();
    info!(
        cards = core.catalog.len(),
        prices = core.cache.len(),
        faq = core.faq.len(),
        "Ready; commands: {}",
        router.commands().join(", ")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal, cleaning up...");
                break;
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        // Each command runs as its own task, like gateway events
                        let router = router.clone();
                        tokio::spawn(async move {
                            match router.dispatch_line(&line).await {
                                Some(response) => println!("{}", response.render()),
                                None if !line.trim().is_empty() => println!("Unknown command. Try /help"),
                                None => {}
                            }
                        });
                    }
                    None => break,
                }
            }
        }
    }

    let stats = core.cache.stats();
    info!(entries = stats.entries, stale = stats.stale, "Shutting down");
    Ok(())
}

