use std::thread;
use std::time::{Duration, Instant};

use crate::error::{GpioError, Result};
use crate::gpio::{Level, OutputPin};

/// How long each note sounds and how long the player rests after it.
#[derive(Debug, Clone)]
pub struct ToneConfig {
    pub duration: Duration,
    pub gap: Duration,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(500),
            gap: Duration::from_millis(100),
        }
    }
}

/// Bit-bang a square wave at `frequency` Hz on `pin` for `duration`.
///
/// Each period drives the pin high for half a period, then low for half a
/// period. The pin is left low. Returns the number of full periods played.
pub fn play_tone<P: OutputPin>(pin: &mut P, frequency: f64, duration: Duration) -> Result<u64> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(GpioError::InvalidFrequency(frequency));
    }

    let half_period = Duration::try_from_secs_f64(0.5 / frequency)
        .map_err(|_| GpioError::InvalidFrequency(frequency))?;
    let end = Instant::now() + duration;
    let mut periods = 0u64;

    while Instant::now() < end {
        pin.set_level(Level::High)?;
        thread::sleep(half_period);
        pin.set_level(Level::Low)?;
        thread::sleep(half_period);
        periods += 1;
    }

    Ok(periods)
}
