//! Certtrack - verification certificate tracking service

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use certtrack::{
    config::Args,
    db::TrackerDb,
    notify::{LogNotifier, NatsClient, NatsNotifier, Notifier},
    provision,
    sweep::SweepScheduler,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("certtrack={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Certtrack - certificate tracking");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Database: {:?}", args.db_path);
    info!("Evidence dir: {:?}", args.evidence_dir);
    info!("Sweep interval: {}s", args.sweep_interval_secs);
    info!("Grace period: {} days", args.grace_period_days);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    if args.nats_enabled {
        info!("NATS: {}", args.nats.nats_url);
    } else {
        info!("NATS: disabled (notices go to the log)");
    }
    info!("======================================");

    // Open the store
    let db = match TrackerDb::open(&args.db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    // Apply the seed file, resolving region codes before anything else runs
    if let Some(ref seed_path) = args.seed_file {
        let seed = match provision::load_seed(seed_path) {
            Ok(seed) => seed,
            Err(e) => {
                error!("Failed to load seed file {:?}: {}", seed_path, e);
                std::process::exit(1);
            }
        };
        if let Err(e) = provision::apply_seed(&db, &seed) {
            error!("Failed to apply seed: {}", e);
            std::process::exit(1);
        }
    }

    match db.stats() {
        Ok(stats) => info!(
            "Store ready: {} certificates ({} pending), {} regions, {} users",
            stats.certificate_count, stats.pending_count, stats.region_count, stats.user_count
        ),
        Err(e) => warn!("Failed to read store stats: {}", e),
    }

    // Wire the notifier (optional NATS, soft-fail in dev mode)
    let notifier: Arc<dyn Notifier> = if args.nats_enabled {
        match NatsClient::new(&args.nats, &format!("certtrack-{}", args.node_id)).await {
            Ok(client) => {
                info!("NATS connected successfully");
                Arc::new(NatsNotifier::new(client))
            }
            Err(e) => {
                if args.dev_mode {
                    warn!("NATS connection failed (dev mode, logging notices instead): {}", e);
                    Arc::new(LogNotifier)
                } else {
                    error!("NATS connection failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    } else {
        Arc::new(LogNotifier)
    };

    // Start the sweep scheduler
    let scheduler = Arc::new(SweepScheduler::new(
        Arc::clone(&db),
        notifier,
        args.sweep_interval(),
        args.admin_email_list(),
    ));
    Arc::clone(&scheduler).start().await?;

    info!("Certtrack running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    scheduler.stop().await;

    Ok(())
}
