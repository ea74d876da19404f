//! Passive buzzer playback for notes received over the micom link.
//!
//! - [`gpio`] — sysfs GPIO control (export, direction, value)
//! - [`note`] — the fixed scale of playable notes
//! - [`tone`] — square-wave generation on an output pin
//! - [`player`] — frame consumer that maps a payload to a note and plays it

pub mod error;
pub mod gpio;
pub mod note;
pub mod player;
pub mod tone;

pub use error::{GpioError, Result};
pub use gpio::{Direction, GpioGuard, Level, OutputPin, SysfsGpio, SysfsPin, DEFAULT_GPIO_ROOT};
pub use note::Note;
pub use player::TonePlayer;
pub use tone::{play_tone, ToneConfig};
