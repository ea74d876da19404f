//! Channel session management for the micom IPC link.
//!
//! A [`Session`] owns one open device endpoint. Sends from any thread are
//! serialized onto the wire; a dedicated receive thread reassembles frames
//! and hands each validated frame to a consumer over a channel, so a slow
//! consumer (a buzzer playing a note) never stalls reassembly.

pub mod config;
pub mod error;
pub mod receiver;
pub mod session;
pub mod shutdown;

pub use config::{SessionConfig, MIN_POLL_INTERVAL};
pub use error::{Result, SessionError};
pub use receiver::{ExitReason, ReceiveLoop, ReceiveState, ReceiveStats, ReceiveSummary, ReceiverHandle};
pub use session::{Session, SessionSender};
pub use shutdown::ShutdownSignal;
