//! OBD-II Monitor - Main Entry Point

use anyhow::Result;
use obd_monitor::{init_logging, init_metrics, run, MonitorConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args().nth(1);
    let config = MonitorConfig::load(path.as_deref())?;
    init_logging(&config)?;
    init_metrics(&config)?;

    info!("=== OBD Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Polling {} PID(s) on {}", config.pids.len(), config.device);

    run(&config).await
}
