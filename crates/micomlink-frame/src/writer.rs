use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use micomlink_transport::DeviceStream;

use crate::codec::{encode_frame, Frame, FrameConfig, Header, MAX_FRAME_SIZE};
use crate::error::{FrameError, Result};

/// Writes complete frames to any `Write` stream.
///
/// Each frame is encoded into an internal buffer first and then written in
/// full, so a frame is never split across two `send` calls.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<usize> {
        self.send(&frame.header, frame.payload.as_ref())
    }

    /// Encode and send a payload. Returns the number of bytes written.
    pub fn send(&mut self, header: &Header, payload: &[u8]) -> Result<usize> {
        if payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        let len = encode_frame(header, payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::DeviceClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()?;
        Ok(len)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame encoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<DeviceStream> {
    /// Create a frame writer for a device and apply the write timeout from config.
    pub fn with_config_device(mut inner: DeviceStream, config: FrameConfig) -> Self {
        inner.set_write_timeout(config.write_timeout);
        Self::with_config(inner, config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::codec::{decode, FRAME_OVERHEAD, MAX_PAYLOAD};

    fn header(target_id: u8) -> Header {
        Header::new(0, 1, 2, 1, target_id)
    }

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        let written = writer.send(&header(5), b"hello").unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(written, wire.len());
        let (frame, consumed) = decode(&wire).unwrap();
        assert_eq!(frame.header.target_id, 5);
        assert_eq!(frame.payload.as_ref(), b"hello");
        assert_eq!(consumed, wire.len());
    }

    #[test]
    fn write_multiple_frames_back_to_back() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.send(&header(1), b"one").unwrap();
        writer.send(&header(2), b"two").unwrap();

        let wire = writer.into_inner().into_inner();
        let (f1, n1) = decode(&wire).unwrap();
        let (f2, n2) = decode(&wire[n1..]).unwrap();

        assert_eq!((f1.header.target_id, f1.payload.as_ref()), (1, b"one".as_ref()));
        assert_eq!((f2.header.target_id, f2.payload.as_ref()), (2, b"two".as_ref()));
        assert_eq!(n1 + n2, wire.len());
    }

    #[test]
    fn write_frame_method() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let frame = Frame::new(header(2), "abc").unwrap();

        writer.write_frame(&frame).unwrap();

        let wire = writer.into_inner().into_inner();
        let (decoded, _) = decode(&wire).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn payload_too_large_rejected() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let err = writer.send(&header(1), &vec![0u8; MAX_PAYLOAD + 1]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadTooLarge {
                size: 1025,
                max: 1024
            }
        ));
        assert!(writer.get_ref().get_ref().is_empty());
    }

    #[test]
    fn configured_limit_rejected() {
        let cfg = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.send(&header(1), b"oversized").unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { max: 4, .. }));
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send(&header(1), b"x").unwrap();

        assert!(flag.load(Ordering::SeqCst));
        let sink = writer.into_inner();
        assert_eq!(sink.data.len(), FRAME_OVERHEAD + 1);
        assert_eq!(decode(&sink.data).unwrap().0.payload.as_ref(), b"x");
    }

    #[test]
    fn short_writes_are_completed() {
        let mut writer = FrameWriter::new(TwoBytesAtATime { data: Vec::new() });
        writer.send(&header(3), b"trickle").unwrap();

        let inner = writer.into_inner();
        let (frame, _) = decode(&inner.data).unwrap();
        assert_eq!(frame.payload.as_ref(), b"trickle");
    }

    #[test]
    fn interrupted_write_retries() {
        let mut writer = FrameWriter::new(InterruptedOnce {
            interrupted: false,
            data: Vec::new(),
        });
        writer.send(&header(5), b"retry").unwrap();

        assert!(!writer.get_ref().data.is_empty());
    }

    #[test]
    fn device_closed_when_write_returns_zero() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(&header(1), b"x").unwrap_err();
        assert!(matches!(err, FrameError::DeviceClosed));
    }

    #[test]
    fn write_error_propagates() {
        let mut writer = FrameWriter::new(BrokenPipe);
        let err = writer.send(&header(1), b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[test]
    #[cfg(unix)]
    fn applies_write_timeout_for_device() {
        let (left, _right) = DeviceStream::pair().unwrap();
        let cfg = FrameConfig {
            write_timeout: Some(std::time::Duration::from_millis(10)),
            ..FrameConfig::default()
        };

        let writer = FrameWriter::with_config_device(left, cfg);
        assert_eq!(
            writer.get_ref().write_timeout(),
            Some(std::time::Duration::from_millis(10))
        );
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct TwoBytesAtATime {
        data: Vec<u8>,
    }

    impl Write for TwoBytesAtATime {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(2);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct InterruptedOnce {
        interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
