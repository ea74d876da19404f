//! CRC16-checked packet framing for the micom IPC link.
//!
//! Every packet exchanged with the companion microcontroller is framed as:
//! - A 3-byte preamble (`0xFF 0x55 0xAA`) for stream synchronization
//! - A 7-byte header: channel, three command bytes, target id, and a
//!   2-byte big-endian payload length
//! - Up to 1024 payload bytes
//! - A 2-byte big-endian CRC16 over header and payload
//!
//! Corrupt packets are dropped and the stream resynchronizes on the next
//! preamble. Callers only ever see validated frames.

pub mod codec;
pub mod command;
pub mod crc;
pub mod deframer;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod tokio_codec;

pub use codec::{
    decode, decode_with_limit, encode, encode_frame, Frame, FrameConfig, Header, CRC_SEED,
    CRC_SIZE, FRAME_OVERHEAD, HEADER_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD, PREAMBLE, PREAMBLE_SIZE,
    START1, START2, SYNC,
};
pub use command::{command_name, CAN_DEMO_START, EDUCATION_CAN_DEMO};
pub use deframer::{DeframeStats, Deframer, Scan};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use tokio_codec::MicomCodec;
