// =============================================================================
// Meridian — Main Entry Point
// =============================================================================
//
// Loads the watchlist, runs the analysis engine over every instrument, and
// logs the ranked recommendation table. With `scan_interval_secs > 0` the
// scan repeats on a timer until Ctrl+C; the watchlist is re-read on every
// pass so a refreshed file is picked up without a restart.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod classify;
mod config;
mod feed;
mod indicators;
mod pipeline;
mod recommend;
mod risk;
mod scan;
mod signals;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;
use crate::feed::{FileSource, SnapshotSource};
use crate::scan::Scanner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Meridian market analyzer starting up");

    let config_path =
        std::env::var("MERIDIAN_CONFIG").unwrap_or_else(|_| "meridian.json".into());

    let mut config = EngineConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        EngineConfig::default()
    });

    // Override the watchlist from env if available.
    if let Ok(path) = std::env::var("MERIDIAN_WATCHLIST") {
        if !path.trim().is_empty() {
            config.watchlist_path = path.trim().to_string();
        }
    }

    info!(
        watchlist = %config.watchlist_path,
        scan_interval_secs = config.scan_interval_secs,
        top_n = config.top_n,
        "configuration ready"
    );

    let interval_secs = config.scan_interval_secs;
    let scanner = Arc::new(Scanner::new(config.clone()));

    // ── 2. Single-shot mode ──────────────────────────────────────────────
    if interval_secs == 0 {
        run_scan(&scanner, &config).await;
        return Ok(());
    }

    // ── 3. Periodic mode with graceful shutdown ──────────────────────────
    let loop_scanner = scanner.clone();
    let loop_config = config.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            run_scan(&loop_scanner, &loop_config).await;
        }
    });

    info!("Scanning every {interval_secs}s. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping");

    info!(completed_scans = scanner.recent().len(), "Meridian shut down complete.");
    Ok(())
}

/// One full pass: load the watchlist, scan it, log the table, write the
/// report. Failures are logged and swallowed so a periodic run survives a
/// bad pass.
async fn run_scan(scanner: &Scanner, config: &EngineConfig) {
    let source: Arc<dyn SnapshotSource + Send + Sync> =
        match FileSource::load(&config.watchlist_path) {
            Ok(source) => Arc::new(source),
            Err(e) => {
                error!(error = %e, watchlist = %config.watchlist_path, "failed to load watchlist");
                return;
            }
        };

    let record = scanner.run(source).await;

    for entry in &record.top {
        info!(
            symbol = %entry.symbol,
            action = %entry.action,
            win_rate = entry.win_rate,
            risk_pct = entry.risk,
            "recommendation"
        );
    }

    if let Some(report_path) = &config.report_path {
        if let Err(e) = scan::write_report(&record, report_path) {
            error!(error = %e, "failed to write scan report");
        }
    }
}
