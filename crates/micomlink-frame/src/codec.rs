use bytes::{BufMut, Bytes, BytesMut};

use crate::crc;
use crate::error::{FrameError, Result};

/// Sync byte opening every preamble.
pub const SYNC: u8 = 0xFF;
/// First start marker.
pub const START1: u8 = 0x55;
/// Second start marker.
pub const START2: u8 = 0xAA;

/// Preamble: sync + start1 + start2.
pub const PREAMBLE: [u8; 3] = [SYNC, START1, START2];
pub const PREAMBLE_SIZE: usize = PREAMBLE.len();

/// Header: channel (1) + cmd1 (1) + cmd2 (1) + cmd3 (1) + target id (1) + length (2) = 7 bytes.
pub const HEADER_SIZE: usize = 7;

/// Trailing CRC16 width.
pub const CRC_SIZE: usize = 2;

/// Everything except the payload.
pub const FRAME_OVERHEAD: usize = PREAMBLE_SIZE + HEADER_SIZE + CRC_SIZE;

/// Maximum payload size (`IPC_MAX_PACKET_SIZE`): 1 KiB.
pub const MAX_PAYLOAD: usize = 0x400;

/// Largest frame on the wire.
pub const MAX_FRAME_SIZE: usize = MAX_PAYLOAD + FRAME_OVERHEAD;

/// CRC16 seed used for every frame.
pub const CRC_SEED: u16 = 0x0000;

/// Routing and command fields of a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Header {
    /// Logical sub-channel on the link.
    pub channel: u8,
    /// Command category.
    pub cmd1: u8,
    /// Sub-action within the category.
    pub cmd2: u8,
    /// Sequence or variant.
    pub cmd3: u8,
    /// Secondary routing id, e.g. a CAN node the micom forwards to.
    pub target_id: u8,
}

impl Header {
    /// Create a header.
    pub const fn new(channel: u8, cmd1: u8, cmd2: u8, cmd3: u8, target_id: u8) -> Self {
        Self {
            channel,
            cmd1,
            cmd2,
            cmd3,
            target_id,
        }
    }

    fn to_bytes(self, length: u16) -> [u8; HEADER_SIZE] {
        let [len_hi, len_lo] = length.to_be_bytes();
        [
            self.channel,
            self.cmd1,
            self.cmd2,
            self.cmd3,
            self.target_id,
            len_hi,
            len_lo,
        ]
    }

    fn parse(bytes: &[u8; HEADER_SIZE]) -> (Self, usize) {
        let header = Self::new(bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]);
        let length = u16::from_be_bytes([bytes[5], bytes[6]]) as usize;
        (header, length)
    }
}

/// A validated packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: Header,
    pub payload: Bytes,
    /// CRC16 over header and payload.
    pub crc: u16,
}

impl Frame {
    /// Build a frame, computing its CRC.
    pub fn new(header: Header, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        check_payload_len(payload.len(), MAX_PAYLOAD)?;
        let crc = frame_crc(&header.to_bytes(payload.len() as u16), &payload);
        Ok(Self {
            header,
            payload,
            crc,
        })
    }

    /// Declared payload length.
    pub fn length(&self) -> usize {
        self.payload.len()
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }
}

/// Encode a frame into the wire format, appending to `dst`.
///
/// Wire format:
/// ```text
/// ┌──────┬────────┬────────┬─────────┬──────┬──────┬──────┬────────┬──────────┬──────────┬─────────┐
/// │ SYNC │ START1 │ START2 │ Channel │ Cmd1 │ Cmd2 │ Cmd3 │ Target │ Length   │ Payload  │ CRC16   │
/// │ 0xFF │ 0x55   │ 0xAA   │ (1B)    │ (1B) │ (1B) │ (1B) │ (1B)   │ (2B BE)  │ (Length) │ (2B BE) │
/// └──────┴────────┴────────┴─────────┴──────┴──────┴──────┴────────┴──────────┴──────────┴─────────┘
/// ```
/// The CRC covers the header and payload, not the preamble.
///
/// Returns the number of bytes appended.
pub fn encode_frame(header: &Header, payload: &[u8], dst: &mut BytesMut) -> Result<usize> {
    check_payload_len(payload.len(), MAX_PAYLOAD)?;

    let header_bytes = header.to_bytes(payload.len() as u16);
    let crc = frame_crc(&header_bytes, payload);

    dst.reserve(FRAME_OVERHEAD + payload.len());
    dst.put_slice(&PREAMBLE);
    dst.put_slice(&header_bytes);
    dst.put_slice(payload);
    dst.put_u16(crc);
    Ok(FRAME_OVERHEAD + payload.len())
}

/// Encode a frame into a fresh buffer.
pub fn encode(header: &Header, payload: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(FRAME_OVERHEAD + payload.len());
    encode_frame(header, payload, &mut buf)?;
    Ok(buf.freeze())
}

/// Decode the first frame in `buf`, allowing payloads up to [`MAX_PAYLOAD`].
///
/// See [`decode_with_limit`].
pub fn decode(buf: &[u8]) -> Result<(Frame, usize)> {
    decode_with_limit(buf, MAX_PAYLOAD)
}

/// Decode the first frame in `buf`.
///
/// Pure over its input; never blocks. On success returns the frame and the
/// number of bytes consumed, counting any noise before the preamble.
///
/// Failures tell the caller how far it may advance via [`FrameError::discard`]:
/// - `Incomplete { skip }`: wait for more bytes; the first `skip` are noise.
/// - `CorruptHeader` / `ChecksumMismatch`: drop bytes up to one past the
///   rejected sync byte and scan again. A bad frame never skips by its own
///   declared length.
pub fn decode_with_limit(buf: &[u8], max_payload: usize) -> Result<(Frame, usize)> {
    let Some(start) = find_preamble(buf) else {
        return Err(FrameError::Incomplete {
            skip: buf.len() - partial_preamble_len(buf),
        });
    };
    let frame = &buf[start..];

    let Some(header_bytes) = frame
        .get(PREAMBLE_SIZE..PREAMBLE_SIZE + HEADER_SIZE)
        .and_then(|bytes| <&[u8; HEADER_SIZE]>::try_from(bytes).ok())
    else {
        return Err(FrameError::Incomplete { skip: start });
    };
    let (header, length) = Header::parse(header_bytes);

    if length > max_payload.min(MAX_PAYLOAD) {
        return Err(FrameError::CorruptHeader {
            length,
            discard: start + 1,
        });
    }

    let total = FRAME_OVERHEAD + length;
    if frame.len() < total {
        return Err(FrameError::Incomplete { skip: start });
    }

    let payload_start = PREAMBLE_SIZE + HEADER_SIZE;
    let crc_start = payload_start + length;
    let payload = &frame[payload_start..crc_start];
    let expected = u16::from_be_bytes([frame[crc_start], frame[crc_start + 1]]);
    let actual = frame_crc(header_bytes, payload);

    if expected != actual {
        return Err(FrameError::ChecksumMismatch {
            expected,
            actual,
            discard: start + 1,
        });
    }

    Ok((
        Frame {
            header,
            payload: Bytes::copy_from_slice(payload),
            crc: expected,
        },
        start + total,
    ))
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 1024, which is also the cap.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

fn frame_crc(header_bytes: &[u8; HEADER_SIZE], payload: &[u8]) -> u16 {
    crc::update(crc::update(CRC_SEED, header_bytes), payload)
}

fn check_payload_len(size: usize, max: usize) -> Result<()> {
    if size > max {
        return Err(FrameError::PayloadTooLarge { size, max });
    }
    Ok(())
}

fn find_preamble(buf: &[u8]) -> Option<usize> {
    buf.windows(PREAMBLE_SIZE).position(|w| w == PREAMBLE)
}

/// Length of the longest preamble prefix the buffer ends with.
fn partial_preamble_len(buf: &[u8]) -> usize {
    (1..PREAMBLE_SIZE)
        .rev()
        .find(|&n| buf.ends_with(&PREAMBLE[..n]))
        .unwrap_or(0)
}
