use std::io::ErrorKind;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;

use micomlink_frame::{Frame, FrameError, FrameReader, FrameWriter, Header};
use micomlink_transport::DeviceStream;
#[cfg(unix)]
use micomlink_transport::CharDevice;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::receiver::{ReceiveLoop, ReceiverHandle};
use crate::shutdown::ShutdownSignal;

/// One open link to the micom device.
///
/// The device handle is split into a writer half, shared behind a mutex by
/// every [`SessionSender`], and a reader half that moves into the receive
/// loop. The accumulation buffer lives in the reader and is never shared.
pub struct Session {
    sender: SessionSender,
    receiver: ReceiveLoop,
    config: SessionConfig,
}

impl Session {
    /// Open the device node at `path`.
    #[cfg(unix)]
    pub fn open(path: impl AsRef<Path>, config: SessionConfig) -> Result<Self> {
        let path = path.as_ref();
        let stream = CharDevice::open(path)?;
        info!(?path, "session opened");
        Self::from_stream(stream, config)
    }

    /// Build a session over an already open endpoint.
    pub fn from_stream(stream: DeviceStream, config: SessionConfig) -> Result<Self> {
        let reader_stream = stream.try_clone()?;
        let frame_config = config.frame_config();

        let reader = FrameReader::with_config_device(reader_stream, frame_config.clone());
        let writer = FrameWriter::with_config_device(stream, frame_config);

        Ok(Self {
            sender: SessionSender {
                writer: Arc::new(Mutex::new(writer)),
            },
            receiver: ReceiveLoop::new(reader, ShutdownSignal::new()),
            config,
        })
    }

    /// A cloneable handle for sending from other threads.
    pub fn sender(&self) -> SessionSender {
        self.sender.clone()
    }

    /// Encode and write one frame. See [`SessionSender::send`].
    pub fn send(&self, header: &Header, payload: &[u8]) -> Result<usize> {
        self.sender.send(header, payload)
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Split into the send handle and the receive loop, for callers that
    /// drive the loop on a thread of their own.
    pub fn into_parts(self) -> (SessionSender, ReceiveLoop) {
        (self.sender, self.receiver)
    }

    /// Start the receive loop on a dedicated thread.
    ///
    /// Validated frames arrive on the returned channel in wire order.
    pub fn spawn_receiver(self) -> Result<(SessionSender, ReceiverHandle, Receiver<Frame>)> {
        let (tx, rx) = mpsc::channel();
        let (sender, mut receiver) = self.into_parts();
        let shutdown = receiver.shutdown_signal();

        let receive = thread::Builder::new()
            .name("micom-rx".into())
            .spawn(move || receiver.run(&tx))
            .map_err(|source| SessionError::Spawn {
                name: "receive",
                source,
            })?;
        debug!("receive thread started");

        Ok((sender, ReceiverHandle::new(shutdown, receive, None), rx))
    }

    /// Start the receive loop and a consumer thread that calls `consumer`
    /// once per validated frame.
    ///
    /// The consumer may block for as long as it likes; frames keep being
    /// reassembled and queue up behind it.
    pub fn spawn_with_consumer<F>(self, mut consumer: F) -> Result<(SessionSender, ReceiverHandle)>
    where
        F: FnMut(Frame) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Frame>();
        let (sender, mut receiver) = self.into_parts();
        let shutdown = receiver.shutdown_signal();

        let dispatch = thread::Builder::new()
            .name("micom-consumer".into())
            .spawn(move || {
                for frame in rx {
                    consumer(frame);
                }
            })
            .map_err(|source| SessionError::Spawn {
                name: "consumer",
                source,
            })?;

        let receive = thread::Builder::new()
            .name("micom-rx".into())
            .spawn(move || receiver.run(&tx))
            .map_err(|source| SessionError::Spawn {
                name: "receive",
                source,
            })?;
        debug!("receive and consumer threads started");

        Ok((sender, ReceiverHandle::new(shutdown, receive, Some(dispatch))))
    }
}

/// Serialized write access to the device.
///
/// Clones share one writer; the mutex guarantees that two frames are never
/// interleaved on the wire.
#[derive(Clone)]
pub struct SessionSender {
    writer: Arc<Mutex<FrameWriter<DeviceStream>>>,
}

impl SessionSender {
    /// Encode and write one frame. Returns the number of bytes written.
    ///
    /// Fails with `Frame(PayloadTooLarge)` before touching the device, or with
    /// `WriteFailure` if the device did not accept the whole frame. There is
    /// no automatic retry.
    pub fn send(&self, header: &Header, payload: &[u8]) -> Result<usize> {
        let mut writer = self.writer.lock().map_err(|_| {
            SessionError::WriteFailure(std::io::Error::other("writer lock poisoned"))
        })?;

        let written = writer.send(header, payload).map_err(|err| match err {
            FrameError::Io(io) => SessionError::WriteFailure(io),
            FrameError::DeviceClosed => SessionError::WriteFailure(std::io::Error::new(
                ErrorKind::WriteZero,
                "device accepted no bytes",
            )),
            other => SessionError::Frame(other),
        })?;

        debug!(
            channel = header.channel,
            cmd1 = header.cmd1,
            cmd2 = header.cmd2,
            cmd3 = header.cmd3,
            target_id = header.target_id,
            len = payload.len(),
            "frame sent"
        );
        Ok(written)
    }
}

impl std::fmt::Debug for SessionSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSender").finish_non_exhaustive()
    }
}
