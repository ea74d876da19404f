/// Errors raised while driving the buzzer pin.
#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    #[error("failed to export GPIO {pin}: {source}")]
    Export { pin: u32, source: std::io::Error },

    #[error("failed to unexport GPIO {pin}: {source}")]
    Unexport { pin: u32, source: std::io::Error },

    #[error("failed to set GPIO {pin} direction to {direction}: {source}")]
    Direction {
        pin: u32,
        direction: &'static str,
        source: std::io::Error,
    },

    #[error("failed to set GPIO {pin} value to {value}: {source}")]
    Value {
        pin: u32,
        value: u8,
        source: std::io::Error,
    },

    /// Tone frequency must be positive and finite.
    #[error("invalid tone frequency: {0} Hz")]
    InvalidFrequency(f64),
}

impl GpioError {
    /// The I/O error behind a sysfs failure, if any.
    pub fn io_source(&self) -> Option<&std::io::Error> {
        match self {
            GpioError::Export { source, .. }
            | GpioError::Unexport { source, .. }
            | GpioError::Direction { source, .. }
            | GpioError::Value { source, .. } => Some(source),
            GpioError::InvalidFrequency(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GpioError>;
