/// Errors that can occur during checksum, frame encoding, or frame decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A checksum was requested over more bytes than were supplied.
    #[error("checksum length {length} exceeds available data ({available} bytes)")]
    InvalidLength { length: usize, available: usize },

    /// The payload exceeds the maximum packet size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// More bytes are needed before a frame can be decoded.
    ///
    /// `skip` leading bytes are noise and may be dropped now.
    #[error("incomplete frame (skip {skip} bytes)")]
    Incomplete { skip: usize },

    /// The header declares a payload length outside the allowed range.
    #[error("corrupt header: declared length {length} (discard {discard} bytes)")]
    CorruptHeader { length: usize, discard: usize },

    /// The trailing CRC16 does not match the header and payload.
    #[error("checksum mismatch: frame carries {expected:#06x}, computed {actual:#06x}")]
    ChecksumMismatch {
        expected: u16,
        actual: u16,
        discard: usize,
    },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device reached end-of-stream.
    #[error("device closed")]
    DeviceClosed,
}

impl FrameError {
    /// Number of leading buffer bytes the caller should drop to resynchronize.
    pub fn discard(&self) -> usize {
        match self {
            FrameError::Incomplete { skip } => *skip,
            FrameError::CorruptHeader { discard, .. }
            | FrameError::ChecksumMismatch { discard, .. } => *discard,
            _ => 0,
        }
    }

    /// True for errors that only affect buffer bookkeeping in a receive loop.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FrameError::Incomplete { .. }
                | FrameError::CorruptHeader { .. }
                | FrameError::ChecksumMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
