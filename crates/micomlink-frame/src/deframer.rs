use bytes::{Buf, BytesMut};
use tracing::{trace, warn};

use crate::codec::{decode_with_limit, Frame, MAX_FRAME_SIZE, MAX_PAYLOAD};
use crate::error::FrameError;

/// Outcome of one scan over the accumulation buffer.
#[derive(Debug)]
pub enum Scan {
    /// A validated frame was extracted.
    Frame(Frame),
    /// The buffer holds no complete frame; read more bytes.
    NeedMore,
    /// A corrupt frame was dropped. Scanning may continue immediately.
    Dropped(FrameError),
}

/// Counters kept while deframing a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeframeStats {
    pub frames: u64,
    pub checksum_failures: u64,
    pub corrupt_headers: u64,
    /// Noise plus bytes discarded while resynchronizing.
    pub bytes_skipped: u64,
}

/// Reassembles frames from an arbitrary chunking of the byte stream.
///
/// Owns the accumulation buffer. Noise and corrupt frames are discarded as
/// they are found, so the buffer never holds more than one maximum-size frame
/// plus the latest chunk.
#[derive(Debug)]
pub struct Deframer {
    buf: BytesMut,
    max_payload: usize,
    stats: DeframeStats,
}

impl Default for Deframer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deframer {
    /// Create a deframer that accepts payloads up to the packet size limit.
    pub fn new() -> Self {
        Self::with_max_payload(MAX_PAYLOAD)
    }

    /// Create a deframer with a tighter payload limit.
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
            max_payload,
            stats: DeframeStats::default(),
        }
    }

    /// Append freshly read bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Try to extract the next frame from the buffered bytes.
    pub fn scan(&mut self) -> Scan {
        match decode_with_limit(&self.buf, self.max_payload) {
            Ok((frame, consumed)) => {
                self.skip(consumed - frame.wire_size());
                self.buf.advance(frame.wire_size());
                self.stats.frames += 1;
                trace!(
                    channel = frame.header.channel,
                    length = frame.length(),
                    "frame extracted"
                );
                Scan::Frame(frame)
            }
            Err(FrameError::Incomplete { skip }) => {
                self.skip(skip);
                Scan::NeedMore
            }
            Err(err) => {
                match err {
                    FrameError::ChecksumMismatch { .. } => self.stats.checksum_failures += 1,
                    FrameError::CorruptHeader { .. } => self.stats.corrupt_headers += 1,
                    _ => {}
                }
                warn!(error = %err, "dropping corrupt frame");
                self.skip(err.discard().max(1));
                Scan::Dropped(err)
            }
        }
    }

    /// Extract the next frame, silently passing over corrupt ones.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            match self.scan() {
                Scan::Frame(frame) => return Some(frame),
                Scan::NeedMore => return None,
                Scan::Dropped(_) => continue,
            }
        }
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Counters since creation.
    pub fn stats(&self) -> DeframeStats {
        self.stats
    }

    /// Update the payload limit for subsequent scans.
    pub fn set_max_payload(&mut self, max_payload: usize) {
        self.max_payload = max_payload;
    }

    /// Drop everything buffered.
    pub fn clear(&mut self) {
        self.skip(self.buf.len());
    }

    fn skip(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        if n > 0 {
            self.buf.advance(n);
            self.stats.bytes_skipped += n as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode, Header};

    fn wire(target_id: u8, payload: &[u8]) -> Vec<u8> {
        encode(&Header::new(0, 1, 2, 1, target_id), payload)
            .unwrap()
            .to_vec()
    }

    #[test]
    fn garbage_frame_garbage() {
        let mut deframer = Deframer::new();
        deframer.extend(&[0x13, 0x37, 0xFF, 0x00]);
        deframer.extend(&wire(5, &[1, 2, 3]));
        deframer.extend(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let frame = deframer.next_frame().expect("one frame");
        assert_eq!(frame.header.target_id, 5);
        assert_eq!(frame.payload.as_ref(), &[1, 2, 3]);
        assert!(deframer.next_frame().is_none());

        let stats = deframer.stats();
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.bytes_skipped, 8);
        assert_eq!(deframer.buffered(), 0);
    }

    #[test]
    fn multiple_frames_in_one_chunk() {
        let mut chunk = wire(1, b"one");
        chunk.extend_from_slice(&wire(2, b"two"));
        chunk.extend_from_slice(&wire(3, b"three"));

        let mut deframer = Deframer::new();
        deframer.extend(&chunk);

        let ids: Vec<u8> = std::iter::from_fn(|| deframer.next_frame())
            .map(|f| f.header.target_id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn byte_at_a_time() {
        let bytes = wire(9, b"slow");
        let mut deframer = Deframer::new();
        let mut frames = Vec::new();

        for byte in bytes {
            deframer.extend(&[byte]);
            if let Some(frame) = deframer.next_frame() {
                frames.push(frame);
            }
        }

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), b"slow");
        assert_eq!(deframer.stats().bytes_skipped, 0);
    }

    #[test]
    fn checksum_failure_is_dropped_and_next_frame_recovered() {
        let mut bad = wire(1, b"corrupted");
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;

        let mut deframer = Deframer::new();
        deframer.extend(&bad);
        deframer.extend(&wire(2, b"intact"));

        assert!(matches!(
            deframer.scan(),
            Scan::Dropped(FrameError::ChecksumMismatch { .. })
        ));
        let frame = deframer.next_frame().expect("second frame survives");
        assert_eq!(frame.header.target_id, 2);
        assert_eq!(deframer.stats().checksum_failures, 1);
        assert_eq!(deframer.stats().bytes_skipped, bad.len() as u64);
    }

    #[test]
    fn corrupt_length_does_not_swallow_following_frame() {
        let mut bad = vec![0xFF, 0x55, 0xAA, 0, 0, 0, 0, 0];
        bad.extend_from_slice(&0xFFFFu16.to_be_bytes());

        let mut deframer = Deframer::new();
        deframer.extend(&bad);
        deframer.extend(&wire(7, b"after"));

        let frame = deframer.next_frame().expect("frame after corrupt header");
        assert_eq!(frame.header.target_id, 7);
        assert_eq!(deframer.stats().corrupt_headers, 1);
    }

    #[test]
    fn noise_is_trimmed_while_waiting() {
        let mut deframer = Deframer::new();
        deframer.extend(&[0u8; 4096]);
        assert!(matches!(deframer.scan(), Scan::NeedMore));
        assert_eq!(deframer.buffered(), 0);

        deframer.extend(&[0x01, 0xFF, 0x55]);
        assert!(matches!(deframer.scan(), Scan::NeedMore));
        assert_eq!(deframer.buffered(), 2);
    }

    #[test]
    fn tightened_limit_drops_large_frames() {
        let mut deframer = Deframer::with_max_payload(4);
        deframer.extend(&wire(1, b"too large"));
        deframer.extend(&wire(2, b"ok"));

        let frame = deframer.next_frame().unwrap();
        assert_eq!(frame.header.target_id, 2);
        assert_eq!(deframer.stats().corrupt_headers, 1);

        deframer.set_max_payload(MAX_PAYLOAD);
        deframer.extend(&wire(3, b"large again"));
        assert_eq!(deframer.next_frame().unwrap().header.target_id, 3);
    }

    #[test]
    fn clear_counts_as_skipped() {
        let mut deframer = Deframer::new();
        deframer.extend(&[0xFF, 0x55]);
        deframer.clear();
        assert_eq!(deframer.buffered(), 0);
        assert_eq!(deframer.stats().bytes_skipped, 2);
    }

    #[test]
    fn false_preamble_holds_real_frame_until_its_length_arrives() {
        let mut deframer = Deframer::new();
        // Preamble look-alike declaring a 32-byte payload.
        deframer.extend(&[0xFF, 0x55, 0xAA, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x20]);
        deframer.extend(&wire(5, &[0x12, 0x34, 0x56, 0x78]));

        assert!(deframer.next_frame().is_none());
        assert_eq!(deframer.buffered(), 26);

        deframer.extend(&[0u8; 18]);
        let frame = deframer.next_frame().expect("real frame after false span");
        assert_eq!(frame.header.target_id, 5);
        assert_eq!(frame.crc, 0xAA7C);
        assert_eq!(deframer.stats().checksum_failures, 1);
    }
}
