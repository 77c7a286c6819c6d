//! Serial Transport Adapter
//!
//! Feeds bytes read from an ELM327 adapter through an [`ObdStream`] and
//! forwards the resulting events over a channel.

use crate::buffer::ReadyState;
use crate::error::ObdError;
use crate::stream::{ObdStream, StreamEvent};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};

/// Size of a single read from the transport
const READ_CHUNK_SIZE: usize = 256;

/// Open an ELM327 adapter on a serial device
///
/// # Arguments
/// * `device` - Serial port device path (e.g. "/dev/ttyUSB0" or "COM3")
/// * `baud_rate` - Baud rate for serial communication
pub fn open_serial(device: &str, baud_rate: u32) -> Result<SerialStream, ObdError> {
    info!("Opening serial port {} at {} baud", device, baud_rate);
    let port = tokio_serial::new(device, baud_rate).open_native_async()?;
    Ok(port)
}

/// Reads adapter output and publishes parsed events
pub struct ObdReader<R> {
    source: R,
    stream: ObdStream,
    events: mpsc::Sender<StreamEvent>,
}

impl<R: AsyncRead + Unpin> ObdReader<R> {
    /// Create a reader over `source`
    pub fn new(source: R, stream: ObdStream, events: mpsc::Sender<StreamEvent>) -> Self {
        Self {
            source,
            stream,
            events,
        }
    }

    /// Read until the source reaches EOF.
    ///
    /// Fails with [`ObdError::ChannelClosed`] if the event receiver is
    /// dropped and with [`ObdError::SerialError`] on read errors.
    pub async fn run(mut self) -> Result<(), ObdError> {
        info!("Starting OBD reader");
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            let n = self.source.read(&mut chunk).await?;
            if n == 0 {
                debug!("Source closed, {} byte(s) left unterminated", self.stream.pending().len());
                break;
            }

            if self.stream.append(&chunk[..n]) == ReadyState::Pending {
                continue;
            }

            // Let the writer send its next command while frames decode
            publish(&self.events, StreamEvent::ReadyForNextCommand).await?;
            for event in self.stream.drain().await {
                publish(&self.events, event).await?;
            }
        }

        info!("OBD reader stopped");
        Ok(())
    }
}

async fn publish(events: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> Result<(), ObdError> {
    events.send(event).await.map_err(|_| ObdError::ChannelClosed)
}
