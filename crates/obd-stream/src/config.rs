//! Stream parser configuration

use crate::error::ObdError;
use serde::{Deserialize, Serialize};

/// Prompt the ELM327 prints when it is ready for a new command
pub const DEFAULT_PROMPT: &str = ">";

/// First byte of a Mode 01 (current data) response
pub const LIVE_DATA_MODE: &str = "41";

/// Order in which events for frames of one response are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitOrder {
    /// Events follow the left-to-right order of frames in the response
    #[default]
    FrameOrder,
    /// Events follow decode completion; consumers must not assume frame order
    CompletionOrder,
}

/// Configuration for [`crate::ObdStream`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// End-of-response marker
    pub prompt: String,
    /// Mode marker of a live data response (two hex digits)
    pub live_data_mode: String,
    /// Emission order of decoded frames
    pub emit_order: EmitOrder,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            live_data_mode: LIVE_DATA_MODE.to_string(),
            emit_order: EmitOrder::default(),
        }
    }
}

impl StreamConfig {
    /// Check that the markers can actually be matched
    pub fn validate(&self) -> Result<(), ObdError> {
        if self.prompt.trim().is_empty() {
            return Err(ObdError::InvalidConfig(
                "prompt must contain a visible character".to_string(),
            ));
        }

        let mode = &self.live_data_mode;
        if mode.len() != 2 || !mode.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ObdError::InvalidConfig(format!(
                "live_data_mode must be two hex digits, got {:?}",
                mode
            )));
        }

        Ok(())
    }
}
