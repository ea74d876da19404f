//! IPC link to a companion microcontroller ("micom").
//!
//! micomlink frames command packets with a sync preamble and a CRC16, carries
//! them over the micom character device, and ships a small demo that plays
//! received notes on a passive buzzer.
//!
//! # Crate Structure
//!
//! - [`transport`] — Character device endpoint
//! - [`frame`] — CRC16 checksum, frame codec, stream reassembly
//! - [`session`] — Serialized sends and a threaded receive loop (behind `session` feature)
//! - [`buzzer`] — Sysfs GPIO tone player (behind `buzzer` feature)

/// Re-export transport types.
pub mod transport {
    pub use micomlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use micomlink_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use micomlink_session::*;
}

/// Re-export buzzer types (requires `buzzer` feature).
#[cfg(feature = "buzzer")]
pub mod buzzer {
    pub use micomlink_buzzer::*;
}
