//! Response Decoder
//!
//! Routes a single frame to its parameter definition.

use crate::error::ObdError;
use crate::payload::{is_hex_payload, to_byte_groups};
use crate::pid::{ParameterRegistry, PidValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A decoded adapter response line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedReading {
    /// Timestamp when the frame was decoded (Unix ms)
    pub timestamp_ms: u64,
    /// Frame text as extracted from the response
    pub frame: String,
    /// Decoded value, present only for known live data parameters
    pub value: Option<PidValue>,
    /// Human-readable value, present only for known live data parameters
    pub pretty: Option<String>,
}

impl ParsedReading {
    /// Create a reading without a decoded value
    pub fn generic(frame: &str) -> Self {
        Self {
            timestamp_ms: now_ms(),
            frame: frame.to_string(),
            value: None,
            pretty: None,
        }
    }

    /// Check if a parameter decoder produced a value
    pub fn is_decoded(&self) -> bool {
        self.value.is_some()
    }
}

/// Decodes frames against a parameter registry
#[derive(Clone)]
pub struct ResponseDecoder {
    registry: Arc<dyn ParameterRegistry>,
    live_data_mode: String,
}

impl ResponseDecoder {
    /// Create a decoder recognising `live_data_mode` as the response mode
    pub fn new(registry: Arc<dyn ParameterRegistry>, live_data_mode: &str) -> Self {
        Self {
            registry,
            live_data_mode: live_data_mode.to_ascii_uppercase(),
        }
    }

    /// Decode one frame.
    ///
    /// Non-hex frames and unknown parameters produce a reading without a
    /// value. Hex frames in any mode other than live data are malformed.
    pub fn decode(&self, frame: &str) -> Result<ParsedReading, ObdError> {
        if !is_hex_payload(frame) {
            debug!("Generic message: {}", frame);
            return Ok(ParsedReading::generic(frame));
        }

        let groups = to_byte_groups(frame);
        if groups.first() != Some(&self.live_data_mode) {
            return Err(ObdError::MalformedResponse(frame.to_string()));
        }

        let Some(code) = groups.get(1) else {
            debug!("Live data response without parameter code: {}", frame);
            return Ok(ParsedReading::generic(frame));
        };

        let Some(definition) = self.registry.lookup(code) else {
            debug!("No decoder registered for PID {}", code);
            return Ok(ParsedReading::generic(frame));
        };

        let mut reading = ParsedReading::generic(frame);
        reading.value = definition.value_from_bytes(frame);
        reading.pretty = definition.formatted_from_bytes(frame);
        debug!("PID {} decoded: {:?}", code, reading.pretty);

        Ok(reading)
    }
}

impl std::fmt::Debug for ResponseDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseDecoder")
            .field("live_data_mode", &self.live_data_mode)
            .finish_non_exhaustive()
    }
}

pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
