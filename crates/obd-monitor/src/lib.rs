//! Live OBD-II Monitor
//!
//! Polls an ELM327 adapter for Mode 01 PIDs, writing the next request each
//! time the adapter prints its prompt, and prints every decoded reading as a
//! JSON line.

use anyhow::{anyhow, Context, Result};
use obd_stream::{mode, open_serial, ObdReader, ObdStream, PidRegistry, StreamEvent};
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod settings;

pub use settings::{MonitorConfig, DEFAULT_CONFIG_FILE};

/// Capacity of the reader-to-session event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Initialize logging
pub fn init_logging(config: &MonitorConfig) -> Result<()> {
    let level = Level::from_str(&config.log_level)
        .map_err(|_| anyhow!("Unknown log level {:?}", config.log_level))?;
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let installed = if config.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.context("Failed to set tracing subscriber")
}

/// Install the Prometheus exporter if an address is configured
pub fn init_metrics(config: &MonitorConfig) -> Result<()> {
    if let Some(addr) = config.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Serving metrics on {}", addr);
    }
    Ok(())
}

/// Commands written to the adapter, one per prompt
#[derive(Debug, Clone)]
pub struct CommandQueue {
    init: Vec<String>,
    pids: Vec<String>,
    sent: usize,
}

impl CommandQueue {
    /// Send `init` once, then cycle through Mode 01 requests for `pids`
    pub fn new(init: &[String], pids: &[String]) -> Self {
        Self {
            init: init.to_vec(),
            pids: pids.iter().map(|pid| pid.to_ascii_uppercase()).collect(),
            sent: 0,
        }
    }

    /// Next command, terminated with a carriage return
    pub fn next_command(&mut self) -> String {
        let command = match self.init.get(self.sent) {
            Some(init) => init.clone(),
            None if self.pids.is_empty() => format!("{:02X}00", mode::CURRENT_DATA),
            None => {
                let index = (self.sent - self.init.len()) % self.pids.len();
                format!("{:02X}{}", mode::CURRENT_DATA, self.pids[index])
            }
        };
        self.sent += 1;
        format!("{}\r", command)
    }
}

/// Open the configured serial port and run a polling session on it
pub async fn run(config: &MonitorConfig) -> Result<()> {
    let port = open_serial(&config.device, config.baud_rate)
        .with_context(|| format!("Failed to open {}", config.device))?;
    run_session(port, config, std::io::stdout()).await
}

/// Poll the adapter behind `transport` until it closes.
///
/// Readings are written to `out` as JSON lines.
pub async fn run_session<T, W>(transport: T, config: &MonitorConfig, mut out: W) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
    W: Write,
{
    let stream = ObdStream::new(config.stream.clone(), Arc::new(PidRegistry::standard()))?;
    let (source, mut sink) = tokio::io::split(transport);
    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let reader = tokio::spawn(ObdReader::new(source, stream, tx).run());

    let mut commands = CommandQueue::new(&config.init_commands, &config.pids);
    let mut readings = 0u64;

    // The adapter already sits at its prompt after open
    send_command(&mut sink, &commands.next_command()).await?;

    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::ReadyForNextCommand => {
                send_command(&mut sink, &commands.next_command()).await?;
            }
            StreamEvent::Reading(reading) => {
                readings += 1;
                match &reading.pretty {
                    Some(pretty) => info!("{} => {}", reading.frame, pretty),
                    None => debug!("{} (no decoder)", reading.frame),
                }
                serde_json::to_writer(&mut out, &reading)?;
                writeln!(out)?;
            }
            StreamEvent::DecodeError(e) => warn!("Skipping frame: {}", e),
        }
    }

    reader.await.context("Reader task failed")??;
    info!("Session ended after {} reading(s)", readings);
    Ok(())
}

async fn send_command<S: AsyncWrite + Unpin>(sink: &mut S, command: &str) -> Result<()> {
    debug!("Sending {:?}", command);
    sink.write_all(command.as_bytes()).await?;
    sink.flush().await?;
    Ok(())
}
