//! privwatch agent entrypoint: connects once, then polls the monitored role's
//! privileges on a fixed interval. An interval of 0 runs a single cycle.

use privwatch_agent::{
    config::AgentConfig,
    collectors::{PgCatalog, PrivilegeCollector},
    logging::StructuredLogger,
    monitor::{self, Monitor},
    storage::StateFile,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

static STOP: AtomicBool = AtomicBool::new(false);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("PRIVWATCH_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = match AgentConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from this file, so report on stderr.
            eprintln!("privwatch-agent: {e}");
            return Err(e.into());
        }
    };

    StructuredLogger::init(config.log.json, &config.log.level);

    info!(role = %config.monitor.role, state_file = ?config.monitor.state_file, "privwatch agent starting");

    let catalog = match PgCatalog::connect(&config.database).await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(error = %e, "cannot reach monitored database");
            return Err(e.into());
        }
    };

    let mut monitor = Monitor::new(
        PrivilegeCollector::new(catalog),
        StateFile::new(&config.monitor.state_file),
        config.monitor.role.clone(),
    )
    .with_cycle_timeout(config.monitor.cycle_timeout());

    let interval_secs = config.monitor.interval_secs;
    if interval_secs > 0 {
        info!(interval_secs, "daemon mode (Ctrl+C to stop)");
        let _ = ctrlc::set_handler(|| {
            STOP.store(true, Ordering::Relaxed);
        });
        monitor.run(config.monitor.interval(), &STOP).await;
        info!("privwatch agent stopping");
    } else {
        match monitor.run_cycle().await {
            Ok(outcome) => monitor::log_outcome(1, monitor.role(), &outcome),
            Err(e) => error!(error = %e, "privilege collection failed"),
        }
        info!("privwatch agent cycle complete");
    }

    Ok(())
}
