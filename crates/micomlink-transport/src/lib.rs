//! Device endpoint abstraction for the micom IPC link.
//!
//! The companion microcontroller is reached through a character device
//! (`/dev/tcc_ipc_micom` on the reference board). This crate opens that node
//! and exposes it as a [`DeviceStream`]: a duplex, blocking byte stream whose
//! reads can be bounded by a timeout so higher layers can shut down cleanly.
//!
//! This is the lowest layer of micomlink. Framing and sessions build on top.

pub mod error;
pub mod stream;

#[cfg(unix)]
pub mod chardev;

pub use error::{Result, TransportError};
pub use stream::DeviceStream;

#[cfg(unix)]
pub use chardev::{CharDevice, DEFAULT_DEVICE_PATH};
