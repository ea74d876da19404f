/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error, e.g. the device could not be opened.
    #[error("transport error: {0}")]
    Transport(#[from] micomlink_transport::TransportError),

    /// Frame-level error surfaced to the caller, e.g. an oversized payload.
    #[error("frame error: {0}")]
    Frame(#[from] micomlink_frame::FrameError),

    /// A frame could not be written to the device in full. Not retried.
    #[error("write failed: {0}")]
    WriteFailure(#[source] std::io::Error),

    /// The device reached end-of-stream or failed while reading.
    #[error("device closed: {0}")]
    DeviceClosed(#[source] std::io::Error),

    /// A session thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },

    /// A session thread panicked.
    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}

pub type Result<T> = std::result::Result<T, SessionError>;
