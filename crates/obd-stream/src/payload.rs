//! Payload classification

/// Check whether a frame is a non-empty string of hex digits.
///
/// Adapter messages such as `NODATA`, `SEARCHING...` or `?` are not.
pub fn is_hex_payload(frame: &str) -> bool {
    !frame.is_empty() && frame.chars().all(|c| c.is_ascii_hexdigit())
}

/// Split a frame into two-character groups, uppercased.
///
/// Spaces are dropped first. An odd-length frame keeps its last character
/// as a one-character group; hex validity is checked by [`is_hex_payload`].
pub fn to_byte_groups(frame: &str) -> Vec<String> {
    let chars: Vec<char> = frame
        .chars()
        .filter(|c| *c != ' ')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    chars
        .chunks(2)
        .map(|pair| pair.iter().collect::<String>())
        .collect()
}

/// Decode the data bytes that follow the mode and parameter groups.
///
/// Returns `None` if fewer than `count` complete hex bytes are available.
pub fn data_bytes(frame: &str, count: usize) -> Option<Vec<u8>> {
    let groups = to_byte_groups(frame);
    let data = groups.get(2..2 + count)?;

    data.iter()
        .map(|group| {
            if group.len() == 2 {
                u8::from_str_radix(group, 16).ok()
            } else {
                None
            }
        })
        .collect()
}
