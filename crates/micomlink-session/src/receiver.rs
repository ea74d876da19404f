use std::io::ErrorKind;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use micomlink_frame::{DeframeStats, Frame, FrameError, FrameReader, Scan};
use micomlink_transport::DeviceStream;
use tracing::{debug, trace};

use crate::error::{Result, SessionError};
use crate::shutdown::ShutdownSignal;

/// States of the receive loop.
///
/// ```text
/// Idle -> Reading -> Scanning -> FrameDelivered -> Scanning
///                             -> Incomplete     -> Reading
///                             -> Corrupt        -> Scanning
/// Reading -> Closed (shutdown or device error)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveState {
    Idle,
    Reading,
    Scanning,
    FrameDelivered,
    Incomplete,
    Corrupt,
    Closed,
}

/// Why a receive loop stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Shutdown was requested through the [`ShutdownSignal`].
    Shutdown,
    /// The frame consumer hung up.
    ConsumerGone,
}

/// Counters for one run of the receive loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiveStats {
    pub frames_delivered: u64,
    pub checksum_failures: u64,
    pub corrupt_headers: u64,
    pub bytes_skipped: u64,
}

impl ReceiveStats {
    fn new(delivered: u64, deframe: DeframeStats) -> Self {
        Self {
            frames_delivered: delivered,
            checksum_failures: deframe.checksum_failures,
            corrupt_headers: deframe.corrupt_headers,
            bytes_skipped: deframe.bytes_skipped,
        }
    }
}

/// Result of a receive loop that ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveSummary {
    pub reason: ExitReason,
    pub stats: ReceiveStats,
}

/// The receive side of a session: reads device bytes, reassembles frames,
/// and forwards each validated frame over a channel.
///
/// Corrupt frames and noise never leave the loop; they only show up in
/// [`ReceiveStats`] and the log.
pub struct ReceiveLoop {
    reader: FrameReader<DeviceStream>,
    shutdown: ShutdownSignal,
    state: ReceiveState,
    delivered: u64,
}

impl ReceiveLoop {
    pub(crate) fn new(reader: FrameReader<DeviceStream>, shutdown: ShutdownSignal) -> Self {
        Self {
            reader,
            shutdown,
            state: ReceiveState::Idle,
            delivered: 0,
        }
    }

    /// Signal that stops this loop.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Current state.
    pub fn state(&self) -> ReceiveState {
        self.state
    }

    /// Run until shutdown, consumer hang-up, or a device error (blocking).
    ///
    /// Returns `Err(SessionError::DeviceClosed)` on EOF or a read failure.
    pub fn run(&mut self, consumer: &Sender<Frame>) -> Result<ReceiveSummary> {
        loop {
            let next = match self.state {
                ReceiveState::Idle => ReceiveState::Reading,
                ReceiveState::Reading => {
                    if self.shutdown.is_requested() {
                        return Ok(self.close(ExitReason::Shutdown));
                    }
                    match self.reader.fill() {
                        Ok(_) => ReceiveState::Scanning,
                        Err(FrameError::Io(err))
                            if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
                        {
                            ReceiveState::Reading
                        }
                        Err(err) => {
                            self.transition(ReceiveState::Closed);
                            return Err(device_closed(err));
                        }
                    }
                }
                ReceiveState::Scanning => match self.reader.scan() {
                    Scan::Frame(frame) => {
                        if consumer.send(frame).is_err() {
                            return Ok(self.close(ExitReason::ConsumerGone));
                        }
                        self.delivered += 1;
                        ReceiveState::FrameDelivered
                    }
                    Scan::NeedMore => ReceiveState::Incomplete,
                    Scan::Dropped(_) => ReceiveState::Corrupt,
                },
                ReceiveState::FrameDelivered | ReceiveState::Corrupt => ReceiveState::Scanning,
                ReceiveState::Incomplete => ReceiveState::Reading,
                ReceiveState::Closed if self.shutdown.is_requested() => {
                    return Ok(self.close(ExitReason::Shutdown));
                }
                ReceiveState::Closed => {
                    return Err(SessionError::DeviceClosed(std::io::Error::new(
                        ErrorKind::NotConnected,
                        "receive loop already closed",
                    )));
                }
            };
            self.transition(next);
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> ReceiveStats {
        ReceiveStats::new(self.delivered, self.reader.stats())
    }

    fn transition(&mut self, next: ReceiveState) {
        if next != self.state {
            trace!(from = ?self.state, to = ?next, "receive state");
        }
        self.state = next;
    }

    fn close(&mut self, reason: ExitReason) -> ReceiveSummary {
        self.transition(ReceiveState::Closed);
        let summary = ReceiveSummary {
            reason,
            stats: self.stats(),
        };
        debug!(?reason, stats = ?summary.stats, "receive loop stopped");
        summary
    }
}

fn device_closed(err: FrameError) -> SessionError {
    match err {
        FrameError::Io(io) => SessionError::DeviceClosed(io),
        FrameError::DeviceClosed => SessionError::DeviceClosed(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            "end of stream",
        )),
        other => SessionError::Frame(other),
    }
}

/// Owner-side handle to a running receive thread.
pub struct ReceiverHandle {
    shutdown: ShutdownSignal,
    receive: JoinHandle<Result<ReceiveSummary>>,
    dispatch: Option<JoinHandle<()>>,
}

impl ReceiverHandle {
    pub(crate) fn new(
        shutdown: ShutdownSignal,
        receive: JoinHandle<Result<ReceiveSummary>>,
        dispatch: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            shutdown,
            receive,
            dispatch,
        }
    }

    /// Request cooperative shutdown. Takes effect within one poll interval.
    pub fn shutdown(&self) {
        self.shutdown.request();
    }

    /// Signal shared with the receive thread.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// True once the receive thread has exited.
    pub fn is_finished(&self) -> bool {
        self.receive.is_finished()
    }

    /// Wait for the receive thread, then for the consumer thread (if any) to
    /// drain frames already handed off.
    pub fn join(self) -> Result<ReceiveSummary> {
        let result = self
            .receive
            .join()
            .map_err(|_| SessionError::ThreadPanicked("receive"))?;
        if let Some(dispatch) = self.dispatch {
            dispatch
                .join()
                .map_err(|_| SessionError::ThreadPanicked("consumer"))?;
        }
        result
    }
}
