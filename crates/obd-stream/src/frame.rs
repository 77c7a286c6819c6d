//! Frame extraction from a completed response buffer

/// Escaped carriage return some adapters and proxies emit as plain text
const ESCAPED_CR: &str = "\\r";

/// Split a completed response into trimmed, non-empty frames.
///
/// Line feeds, carriage returns and escaped `\r` sequences all separate
/// frames. The prompt and every whitespace character are removed from each
/// frame, so `"41 0C 1B 56"` becomes `"410C1B56"`. Frames keep the order in
/// which they appeared in the buffer.
pub fn extract_frames(buffer: &str, prompt: &str) -> Vec<String> {
    let without_prompt = if prompt.is_empty() {
        buffer.to_string()
    } else {
        buffer.replace(prompt, "")
    };

    without_prompt
        .replace(ESCAPED_CR, "\n")
        .split(['\r', '\n'])
        .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|frame| !frame.is_empty())
        .collect()
}
