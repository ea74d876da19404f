use std::io::{ErrorKind, Read};

use micomlink_transport::DeviceStream;

use crate::codec::{Frame, FrameConfig};
use crate::deframer::{DeframeStats, Deframer, Scan};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 2 * 1024;

/// Reads validated frames from any `Read` stream.
///
/// Handles partial reads, noise, and corrupt frames internally. Callers
/// either get a frame whose CRC checked out or an I/O-level error.
pub struct FrameReader<T> {
    inner: T,
    deframer: Deframer,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            deframer: Deframer::with_max_payload(config.max_payload_size),
            config,
        }
    }

    /// Read the next valid frame (blocking).
    ///
    /// Returns `Err(FrameError::DeviceClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.deframer.next_frame() {
                return Ok(frame);
            }
            self.fill()?;
        }
    }

    /// Perform one read from the stream into the accumulation buffer.
    ///
    /// Interrupted reads are retried. Timeouts surface as `FrameError::Io`
    /// so a caller can check for shutdown between reads.
    pub fn fill(&mut self) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => return Err(FrameError::DeviceClosed),
                Ok(n) => {
                    self.deframer.extend(&chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Scan the buffered bytes once without reading.
    pub fn scan(&mut self) -> Scan {
        self.deframer.scan()
    }

    /// Deframing counters.
    pub fn stats(&self) -> DeframeStats {
        self.deframer.stats()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame decoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
        self.deframer.set_max_payload(max_payload_size);
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<DeviceStream> {
    /// Create a frame reader for a device and apply the read timeout from config.
    pub fn with_config_device(mut inner: DeviceStream, config: FrameConfig) -> Self {
        inner.set_read_timeout(config.read_timeout);
        Self::with_config(inner, config)
    }
}
