//! ELM327 Response Stream Parser
//!
//! This crate turns the raw text an ELM327-compatible OBD-II adapter prints
//! on its serial port into structured readings. Responses are buffered until
//! the adapter's `>` prompt, split into frames, classified as hex payload or
//! adapter message, and decoded through a registry of PID definitions.

mod buffer;
mod client;
mod config;
mod decoder;
mod error;
mod frame;
mod payload;
mod pid;
mod stream;

pub use buffer::{is_complete, ReadyState, ResponseBuffer};
pub use client::{open_serial, ObdReader};
pub use config::{EmitOrder, StreamConfig, DEFAULT_PROMPT, LIVE_DATA_MODE};
pub use decoder::{ParsedReading, ResponseDecoder};
pub use error::ObdError;
pub use frame::extract_frames;
pub use payload::{data_bytes, is_hex_payload, to_byte_groups};
pub use pid::{ParameterDefinition, ParameterRegistry, Pid, PidRegistry, PidValue};
pub use stream::{ObdStream, StreamEvent};

/// OBD-II mode constants
pub mod mode {
    /// Current data
    pub const CURRENT_DATA: u8 = 0x01;
    /// Offset added to the request mode in a positive response
    pub const RESPONSE_OFFSET: u8 = 0x40;
}
