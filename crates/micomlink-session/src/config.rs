use std::time::Duration;

use micomlink_frame::{FrameConfig, MAX_PAYLOAD};

/// Smallest read timeout handed to the device. Reads must stay bounded for
/// shutdown requests to be seen.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Session behavior configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on a single blocking device read. The receive loop checks
    /// for shutdown at least this often. Raised to [`MIN_POLL_INTERVAL`].
    pub poll_interval: Duration,
    /// Optional bound on a blocking device write. `None` waits as long as the
    /// device does.
    pub write_timeout: Option<Duration>,
    /// Maximum payload size for both directions.
    pub max_payload_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            write_timeout: None,
            max_payload_size: MAX_PAYLOAD,
        }
    }
}

impl SessionConfig {
    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_payload_size,
            read_timeout: Some(self.poll_interval.max(MIN_POLL_INTERVAL)),
            write_timeout: self.write_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_poll_interval_still_bounds_reads() {
        let config = SessionConfig {
            poll_interval: Duration::ZERO,
            ..SessionConfig::default()
        };
        assert_eq!(config.frame_config().read_timeout, Some(MIN_POLL_INTERVAL));
    }

    #[test]
    fn default_poll_interval_passes_through() {
        let frame = SessionConfig::default().frame_config();
        assert_eq!(frame.read_timeout, Some(Duration::from_millis(200)));
        assert_eq!(frame.write_timeout, None);
        assert_eq!(frame.max_payload_size, MAX_PAYLOAD);
    }
}
