//! Command identifiers carried in the `cmd1`/`cmd2` header bytes.

/// `cmd1` category: education board CAN demo.
pub const EDUCATION_CAN_DEMO: u8 = 0x01;

/// `cmd2` sub-action of [`EDUCATION_CAN_DEMO`]: start the demo.
pub const CAN_DEMO_START: u8 = 0x02;

/// Returns a human-readable name for a `cmd1` category.
pub fn command_name(cmd1: u8) -> &'static str {
    match cmd1 {
        EDUCATION_CAN_DEMO => "EDUCATION_CAN_DEMO",
        _ => "UNKNOWN",
    }
}
