//! Stream Orchestrator
//!
//! Drives the response buffer, frame extraction and decoding for every
//! chunk read from the adapter.

use crate::buffer::{is_complete, ReadyState, ResponseBuffer};
use crate::config::{EmitOrder, StreamConfig};
use crate::decoder::{ParsedReading, ResponseDecoder};
use crate::error::ObdError;
use crate::frame::extract_frames;
use crate::pid::{ParameterRegistry, PidRegistry};
use metrics::counter;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Event emitted by [`ObdStream`]
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The adapter printed its prompt; the next command may be written
    ReadyForNextCommand,
    /// A frame was decoded
    Reading(ParsedReading),
    /// A frame could not be decoded; the stream continues
    DecodeError(ObdError),
}

/// Stateful parser turning raw adapter chunks into [`StreamEvent`]s.
///
/// Chunks must be fed in arrival order; `append`, `drain` and `accept` take
/// `&mut self`, so two chunks can never be appended concurrently.
///
/// Transports that write commands should call [`append`](Self::append) and
/// signal [`StreamEvent::ReadyForNextCommand`] as soon as it returns
/// [`ReadyState::Ready`], then call [`drain`](Self::drain) for the frame
/// events. [`accept`](Self::accept) does both and returns everything at once.
pub struct ObdStream {
    buffer: ResponseBuffer,
    decoder: ResponseDecoder,
    prompt: String,
    emit_order: EmitOrder,
}

impl ObdStream {
    /// Create a stream parser with the given configuration and registry
    pub fn new(
        config: StreamConfig,
        registry: Arc<dyn ParameterRegistry>,
    ) -> Result<Self, ObdError> {
        config.validate()?;
        info!(
            "Creating OBD stream: prompt={:?}, mode={}, order={:?}",
            config.prompt, config.live_data_mode, config.emit_order
        );
        Ok(Self::with_config(config, registry))
    }

    /// Create a stream parser with default configuration and the standard PIDs
    pub fn standard() -> Self {
        Self::with_config(StreamConfig::default(), Arc::new(PidRegistry::standard()))
    }

    fn with_config(config: StreamConfig, registry: Arc<dyn ParameterRegistry>) -> Self {
        Self {
            buffer: ResponseBuffer::new(config.prompt.clone()),
            decoder: ResponseDecoder::new(registry, &config.live_data_mode),
            prompt: config.prompt,
            emit_order: config.emit_order,
        }
    }

    /// Buffer one chunk read from the adapter.
    ///
    /// [`ReadyState::Ready`] means the adapter is at its prompt: the next
    /// command may be written before the buffered frames are drained.
    pub fn append(&mut self, chunk: &[u8]) -> ReadyState {
        self.buffer.append(chunk)
    }

    /// Decode every frame of the completed response and clear the buffer.
    ///
    /// Returns one event per frame. Does nothing while the response is
    /// incomplete.
    ///
    /// # Panics
    ///
    /// With [`EmitOrder::CompletionOrder`] frames are decoded on a
    /// [`JoinSet`], which panics outside a Tokio runtime. The default
    /// [`EmitOrder::FrameOrder`] decodes inline and needs no runtime.
    pub async fn drain(&mut self) -> Vec<StreamEvent> {
        if !is_complete(self.buffer.as_str(), &self.prompt) {
            return Vec::new();
        }

        counter!("obd_stream_buffers_total").increment(1);

        let frames = extract_frames(self.buffer.as_str(), &self.prompt);
        debug!("Extracted {} frame(s)", frames.len());

        let outcomes = match self.emit_order {
            EmitOrder::FrameOrder => self.decode_in_order(&frames),
            EmitOrder::CompletionOrder => self.decode_concurrently(&frames).await,
        };

        self.buffer.reset();

        outcomes
            .into_iter()
            .map(|outcome| match outcome {
                Ok(reading) => {
                    counter!("obd_stream_readings_total").increment(1);
                    StreamEvent::Reading(reading)
                }
                Err(e) => {
                    counter!("obd_stream_decode_errors_total").increment(1);
                    warn!("Failed to decode frame: {}", e);
                    StreamEvent::DecodeError(e)
                }
            })
            .collect()
    }

    /// Feed one chunk and drain it if the response is complete.
    ///
    /// Returns nothing while the response is incomplete. Once the prompt
    /// arrives, returns [`StreamEvent::ReadyForNextCommand`] followed by one
    /// event per extracted frame, and clears the buffer. Callers that need
    /// the ready signal before decoding finishes use `append` and `drain`.
    ///
    /// # Panics
    ///
    /// Same as [`drain`](Self::drain).
    pub async fn accept(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.append(chunk) == ReadyState::Pending {
            return Vec::new();
        }

        let mut events = vec![StreamEvent::ReadyForNextCommand];
        events.extend(self.drain().await);
        events
    }

    /// Text buffered since the last complete response
    pub fn pending(&self) -> &str {
        self.buffer.as_str()
    }

    /// Configured emission order
    pub fn emit_order(&self) -> EmitOrder {
        self.emit_order
    }

    fn decode_in_order(&self, frames: &[String]) -> Vec<Result<ParsedReading, ObdError>> {
        frames
            .iter()
            .map(|frame| {
                panic::catch_unwind(AssertUnwindSafe(|| self.decoder.decode(frame)))
                    .unwrap_or_else(|_| {
                        error!("Decoder panicked on frame {}", frame);
                        Err(ObdError::DecoderFailed(frame.clone()))
                    })
            })
            .collect()
    }

    async fn decode_concurrently(
        &self,
        frames: &[String],
    ) -> Vec<Result<ParsedReading, ObdError>> {
        let mut tasks = JoinSet::new();
        for (index, frame) in frames.iter().enumerate() {
            let decoder = self.decoder.clone();
            let frame = frame.clone();
            tasks.spawn(async move { (index, decoder.decode(&frame)) });
        }

        let mut outcomes = Vec::with_capacity(frames.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!("Frame decode task failed: {}", e),
            }
        }

        // A panicking decoder still yields one event for its frame
        let missing: Vec<usize> = (0..frames.len())
            .filter(|index| !outcomes.iter().any(|(done, _)| done == index))
            .collect();
        for index in missing {
            outcomes.push((index, Err(ObdError::DecoderFailed(frames[index].clone()))));
        }

        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

impl std::fmt::Debug for ObdStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObdStream")
            .field("pending", &self.buffer.as_str())
            .field("decoder", &self.decoder)
            .field("emit_order", &self.emit_order)
            .finish()
    }
}
