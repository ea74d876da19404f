//! `tokio_util::codec` adapter for async transports.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::codec::{decode_with_limit, encode_frame, Frame, MAX_FRAME_SIZE, MAX_PAYLOAD};
use crate::error::FrameError;

/// Frame codec for `FramedRead`/`FramedWrite`.
///
/// Applies the same resynchronization rules as [`crate::Deframer`]: noise is
/// skipped, corrupt frames are logged and dropped, and only validated frames
/// are yielded.
#[derive(Debug, Clone)]
pub struct MicomCodec {
    max_payload: usize,
}

impl MicomCodec {
    pub fn new() -> Self {
        Self::with_max_payload(MAX_PAYLOAD)
    }

    pub fn with_max_payload(max_payload: usize) -> Self {
        Self { max_payload }
    }
}

impl Default for MicomCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MicomCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        loop {
            match decode_with_limit(src, self.max_payload) {
                Ok((frame, consumed)) => {
                    src.advance(consumed);
                    return Ok(Some(frame));
                }
                Err(FrameError::Incomplete { skip }) => {
                    src.advance(skip);
                    src.reserve(MAX_FRAME_SIZE.saturating_sub(src.len()));
                    return Ok(None);
                }
                Err(err) if err.is_recoverable() => {
                    warn!(error = %err, "dropping corrupt frame");
                    src.advance(err.discard().clamp(1, src.len()));
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Encoder<Frame> for MicomCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        if item.payload.len() > self.max_payload {
            return Err(FrameError::PayloadTooLarge {
                size: item.payload.len(),
                max: self.max_payload,
            });
        }
        encode_frame(&item.header, &item.payload, dst).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Header;

    #[test]
    fn encode_then_decode() {
        let mut codec = MicomCodec::new();
        let mut buf = BytesMut::new();
        let frame = Frame::new(Header::new(1, 1, 2, 3, 4), &b"async"[..]).unwrap();

        codec.encode(frame.clone(), &mut buf).unwrap();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();

        assert_eq!(decoded, frame);
        assert!(buf.is_empty());
    }

    #[test]
    fn waits_for_more_and_trims_noise() {
        let mut codec = MicomCodec::new();
        let mut buf = BytesMut::from(&[0x00, 0x11, 0xFF, 0x55][..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.as_ref(), &[0xFF, 0x55]);
    }

    #[test]
    fn skips_corrupt_frame() {
        let mut codec = MicomCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(Frame::new(Header::default(), &b"bad"[..]).unwrap(), &mut buf)
            .unwrap();
        let last = buf.len() - 1;
        buf[last] ^= 0x01;
        codec
            .encode(Frame::new(Header::new(0, 0, 0, 0, 9), &b"good"[..]).unwrap(), &mut buf)
            .unwrap();

        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.header.target_id, 9);
        assert!(buf.is_empty());
    }

    #[test]
    fn encoder_respects_limit() {
        let mut codec = MicomCodec::with_max_payload(2);
        let mut buf = BytesMut::new();
        let err = codec
            .encode(Frame::new(Header::default(), &b"abc"[..]).unwrap(), &mut buf)
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { max: 2, .. }));
    }

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        use futures_util::{SinkExt, StreamExt};
        use tokio::io::AsyncWriteExt;
        use tokio_util::codec::{FramedRead, FramedWrite};

        let (client, server) = tokio::io::duplex(4096);
        let mut sink = FramedWrite::new(client, MicomCodec::new());
        let mut stream = FramedRead::new(server, MicomCodec::new());

        sink.get_mut().write_all(&[0x00, 0x42]).await.unwrap();
        let frame = Frame::new(Header::new(0, 1, 2, 1, 5), vec![0x12, 0x34, 0x56, 0x78]).unwrap();
        sink.send(frame.clone()).await.unwrap();

        let received = stream.next().await.unwrap().unwrap();
        assert_eq!(received, frame);
        assert_eq!(received.crc, 0xAA7C);
    }
}
