//! Property-based tests for the response stream parser.
//!
//! These tests use proptest to check that framing and classification hold
//! for arbitrary chunkings and payloads.

use obd_stream::{
    extract_frames, is_hex_payload, ObdStream, PidRegistry, ReadyState, ResponseBuffer,
    ResponseDecoder, StreamEvent,
};
use proptest::prelude::*;
use std::sync::Arc;

/// Strategy for adapter output lines without the prompt.
fn response_body() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9A-F NODATSRCHIG.?\r\n]{0,40}")
        .expect("Failed to create response body regex strategy")
}

/// Strategy for non-empty hex payloads.
fn hex_payload() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9A-Fa-f]{1,24}")
        .expect("Failed to create hex payload regex strategy")
}

/// Split `bytes` at the given (unsorted, possibly duplicate) offsets.
fn chunk(bytes: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut cuts: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for cut in cuts {
        chunks.push(bytes[start..cut].to_vec());
        start = cut;
    }
    chunks.push(bytes[start..].to_vec());
    chunks
}

proptest! {
    /// Property: completion is reached exactly once, on the chunk holding the prompt.
    #[test]
    fn prop_chunk_boundary_independence(
        body in response_body(),
        cuts in prop::collection::vec(any::<usize>(), 0..8),
    ) {
        let input = format!("{}>", body);
        let prompt_at = input.len() - 1;
        let mut buffer = ResponseBuffer::new(">");

        let mut consumed = 0;
        let mut ready_count = 0;
        for piece in chunk(input.as_bytes(), &cuts) {
            consumed += piece.len();
            if buffer.append(&piece) == ReadyState::Ready {
                ready_count += 1;
                prop_assert!(consumed > prompt_at);
                buffer.reset();
            } else if ready_count == 0 {
                prop_assert!(consumed <= prompt_at);
            }
        }

        prop_assert_eq!(ready_count, 1);
    }

    /// Property: extracting frames from extracted frames changes nothing.
    #[test]
    fn prop_extract_frames_idempotent(body in response_body()) {
        let frames = extract_frames(&format!("{}>", body), ">");
        for frame in &frames {
            prop_assert!(!frame.is_empty());
            prop_assert_eq!(extract_frames(frame, ">"), vec![frame.clone()]);
        }
        prop_assert_eq!(extract_frames(&frames.join("\r"), ">"), frames);
    }

    /// Property: hex digits are hex; any inserted non-hex character is not.
    #[test]
    fn prop_hex_classification(
        payload in hex_payload(),
        position in any::<usize>(),
        intruder in prop::sample::select(vec!['G', 'z', ' ', '.', '>', '?', '\r']),
    ) {
        prop_assert!(is_hex_payload(&payload));

        let mut tainted = payload.clone();
        tainted.insert(position % (payload.len() + 1), intruder);
        prop_assert!(!is_hex_payload(&tainted));
    }

    /// Property: decoding the same frame twice gives the same reading.
    #[test]
    fn prop_decode_deterministic(pid in 0u8..=0x20, data in prop::collection::vec(any::<u8>(), 0..4)) {
        let decoder = ResponseDecoder::new(Arc::new(PidRegistry::standard()), "41");
        let mut frame = format!("41{:02X}", pid);
        for byte in &data {
            frame.push_str(&format!("{:02X}", byte));
        }

        let first = decoder.decode(&frame).unwrap();
        let second = decoder.decode(&frame).unwrap();
        prop_assert_eq!(first.frame, second.frame);
        prop_assert_eq!(first.value, second.value);
        prop_assert_eq!(first.pretty, second.pretty);
    }
}

#[tokio::test]
async fn test_no_carry_over_between_responses() {
    let mut stream = ObdStream::standard();

    for (input, expected) in [
        (&b"41 0C 1B 56\r\r>"[..], "410C1B56"),
        (&b"FFAB\r>"[..], "FFAB"),
        (&b"NO DATA\r\r>"[..], "NODATA"),
        (&b"410D32\r>"[..], "410D32"),
    ] {
        let events = stream.accept(input).await;
        assert_eq!(events.len(), 2, "events for {:?}", expected);
        let frame = match &events[1] {
            StreamEvent::Reading(reading) => reading.frame.clone(),
            StreamEvent::DecodeError(e) => e.to_string(),
            StreamEvent::ReadyForNextCommand => panic!("duplicate ready signal"),
        };
        assert!(frame.ends_with(expected), "{} vs {}", frame, expected);
        assert!(stream.pending().is_empty());
    }
}
