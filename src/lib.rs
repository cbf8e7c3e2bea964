pub mod config;
pub mod models;
pub mod db;
pub mod eligibility; // Timing gate: cycle caps, spacing, countdown
pub mod administration; // Stock-aware administration gate
pub mod forecast; // Supply forecasting
pub mod validation; // Backdated dose checks
pub mod schedule; // Day plan across regimens
pub mod service; // SQLite-backed administration service

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::info!("{} engine v{}", config::APP_NAME, config::APP_VERSION);
}
