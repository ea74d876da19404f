use std::fs::OpenOptions;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::DeviceStream;

/// Device node exposed by the micom IPC driver on the reference board.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/tcc_ipc_micom";

/// Character device transport.
///
/// Opens the device node read/write. The node is used as-is: no ioctl
/// configuration, no exclusive lock. Regular files and FIFOs are accepted too
/// so the link can be replayed from captures.
pub struct CharDevice;

impl CharDevice {
    /// Open the device node at `path` for duplex I/O (blocking).
    pub fn open(path: impl AsRef<Path>) -> Result<DeviceStream> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| TransportError::Open {
                path: path.to_path_buf(),
                source: e,
            })?;

        let metadata = file.metadata().map_err(|e| TransportError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        if metadata.file_type().is_char_device() {
            info!(?path, "opened character device");
        } else {
            debug!(?path, "opened non-character device as byte stream");
        }

        Ok(DeviceStream::from_file(file))
    }

    /// Open the default micom device node.
    pub fn open_default() -> Result<DeviceStream> {
        Self::open(DEFAULT_DEVICE_PATH)
    }
}
