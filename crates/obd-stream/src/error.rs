//! OBD-II Stream Error Types

use thiserror::Error;

/// Errors that can occur while parsing adapter output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObdError {
    /// Hex payload that is not a live data response
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Parameter decoder aborted while decoding the frame
    #[error("Decoder failed on frame: {0}")]
    DecoderFailed(String),

    /// Serial port or transport error
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Event consumer dropped its receiver
    #[error("Event channel closed")]
    ChannelClosed,

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for ObdError {
    fn from(err: std::io::Error) -> Self {
        ObdError::SerialError(err.to_string())
    }
}

impl From<tokio_serial::Error> for ObdError {
    fn from(err: tokio_serial::Error) -> Self {
        ObdError::SerialError(err.to_string())
    }
}
