//! Response Buffer
//!
//! Accumulates adapter output across reads until the prompt arrives.

use tracing::debug;

/// Check whether a buffer holds a complete response
pub fn is_complete(buffer: &str, prompt: &str) -> bool {
    buffer.contains(prompt)
}

/// Result of appending a chunk to the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Prompt not seen yet, more input needed
    Pending,
    /// Buffer holds a complete response
    Ready,
}

/// Pending text received since the last complete response
#[derive(Debug, Clone)]
pub struct ResponseBuffer {
    /// Accumulated text
    pending: String,
    /// End-of-response marker
    prompt: String,
}

impl ResponseBuffer {
    /// Create an empty buffer that completes on `prompt`
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            pending: String::new(),
            prompt: prompt.into(),
        }
    }

    /// Append a raw chunk and report whether the response is complete
    pub fn append(&mut self, chunk: &[u8]) -> ReadyState {
        let text = String::from_utf8_lossy(chunk);
        debug!("Received chunk: {:?}", text);

        self.pending.push_str(&text);
        debug!("Buffered: {:?}", self.pending);

        if is_complete(&self.pending, &self.prompt) {
            ReadyState::Ready
        } else {
            ReadyState::Pending
        }
    }

    /// Accumulated text
    pub fn as_str(&self) -> &str {
        &self.pending
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Discard everything buffered
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
