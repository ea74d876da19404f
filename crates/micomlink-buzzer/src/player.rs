use std::thread;

use micomlink_frame::Frame;
use tracing::{info, warn};

use crate::error::Result;
use crate::gpio::OutputPin;
use crate::note::Note;
use crate::tone::{play_tone, ToneConfig};

/// Frame consumer that plays the note selected by the first payload byte.
pub struct TonePlayer<P> {
    pin: P,
    config: ToneConfig,
}

impl<P: OutputPin> TonePlayer<P> {
    pub fn new(pin: P) -> Self {
        Self::with_config(pin, ToneConfig::default())
    }

    pub fn with_config(pin: P, config: ToneConfig) -> Self {
        Self { pin, config }
    }

    /// Play the note carried by `frame` (blocking for the note and the gap).
    ///
    /// Frames without a payload or with an unknown selector are logged and
    /// skipped; `Ok(None)` is returned for them. Pin failures are returned.
    pub fn play_frame(&mut self, frame: &Frame) -> Result<Option<Note>> {
        let Some(&selector) = frame.payload.first() else {
            warn!(channel = frame.header.channel, "frame without note selector");
            return Ok(None);
        };
        let Some(note) = Note::from_selector(selector) else {
            warn!(selector, "received unknown note");
            return Ok(None);
        };

        info!(%note, "playing note");
        play_tone(&mut self.pin, note.frequency_hz(), self.config.duration)?;
        if !self.config.gap.is_zero() {
            thread::sleep(self.config.gap);
        }
        Ok(Some(note))
    }

    pub fn config(&self) -> &ToneConfig {
        &self.config
    }

    pub fn into_pin(self) -> P {
        self.pin
    }
}
