//! Conversions between i16 samples and the little-endian byte stream
//! the core's loops move around.

use std::collections::VecDeque;

/// Encode samples as LE bytes, the on-disk format of `.pcm` files.
pub(crate) fn samples_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Pop one sample off a byte queue; silence when the queue runs dry.
///
/// A trailing odd byte (possible only if the recorded file was
/// truncated mid-sample) is dropped.
pub(crate) fn pop_sample(queue: &mut VecDeque<u8>) -> i16 {
    match (queue.pop_front(), queue.pop_front()) {
        (Some(lo), Some(hi)) => i16::from_le_bytes([lo, hi]),
        _ => 0,
    }
}
