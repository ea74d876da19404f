use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// An open device endpoint implementing `Read` and `Write`.
///
/// On the target board this wraps the micom character device. For loopback
/// and tests it can also wrap one end of a Unix socket pair, which behaves
/// like a duplex character device from the framing layer's point of view.
pub struct DeviceStream {
    inner: DeviceStreamInner,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

enum DeviceStreamInner {
    #[cfg(unix)]
    Device(std::fs::File),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for DeviceStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        #[cfg(unix)]
        if let Some(timeout) = self.read_timeout {
            self.wait_ready(libc::POLLIN, timeout)?;
        }
        match &mut self.inner {
            #[cfg(unix)]
            DeviceStreamInner::Device(file) => file.read(buf),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for DeviceStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        #[cfg(unix)]
        if let Some(timeout) = self.write_timeout {
            self.wait_ready(libc::POLLOUT, timeout)?;
        }
        match &mut self.inner {
            #[cfg(unix)]
            DeviceStreamInner::Device(file) => file.write(buf),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            DeviceStreamInner::Device(file) => file.flush(),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl DeviceStream {
    /// Wrap an already opened device node.
    #[cfg(unix)]
    pub(crate) fn from_file(file: std::fs::File) -> Self {
        Self {
            inner: DeviceStreamInner::Device(file),
            read_timeout: None,
            write_timeout: None,
        }
    }

    /// Wrap one end of a Unix socket.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: DeviceStreamInner::Unix(stream),
            read_timeout: None,
            write_timeout: None,
        }
    }

    /// Create a connected pair of in-memory endpoints.
    ///
    /// Bytes written to one end are readable from the other, which makes the
    /// pair a stand-in for the micom device and its firmware.
    #[cfg(unix)]
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = std::os::unix::net::UnixStream::pair()?;
        Ok((Self::from_unix(left), Self::from_unix(right)))
    }

    /// Bound blocking reads. A read that sees no data within `timeout` fails
    /// with [`std::io::ErrorKind::TimedOut`].
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout.filter(|t| !t.is_zero());
    }

    /// Bound blocking writes. A write that cannot proceed within `timeout`
    /// fails with [`std::io::ErrorKind::TimedOut`].
    pub fn set_write_timeout(&mut self, timeout: Option<Duration>) {
        self.write_timeout = timeout.filter(|t| !t.is_zero());
    }

    /// Current read timeout.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Current write timeout.
    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// Timeouts are copied to the clone and tracked independently afterwards.
    pub fn try_clone(&self) -> Result<Self> {
        let inner = match &self.inner {
            #[cfg(unix)]
            DeviceStreamInner::Device(file) => DeviceStreamInner::Device(file.try_clone()?),
            #[cfg(unix)]
            DeviceStreamInner::Unix(stream) => DeviceStreamInner::Unix(stream.try_clone()?),
        };
        Ok(Self {
            inner,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
        })
    }

    /// Endpoint kind for diagnostics.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            #[cfg(unix)]
            DeviceStreamInner::Device(_) => "device",
            #[cfg(unix)]
            DeviceStreamInner::Unix(_) => "unix",
        }
    }

    #[cfg(unix)]
    fn raw_fd(&self) -> std::os::fd::RawFd {
        use std::os::fd::AsRawFd;

        match &self.inner {
            DeviceStreamInner::Device(file) => file.as_raw_fd(),
            DeviceStreamInner::Unix(stream) => stream.as_raw_fd(),
        }
    }

    #[cfg(unix)]
    fn wait_ready(&self, events: libc::c_short, timeout: Duration) -> std::io::Result<()> {
        let mut pfd = libc::pollfd {
            fd: self.raw_fd(),
            events,
            revents: 0,
        };
        let millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

        // SAFETY: `pfd` is a valid, writable pollfd and we pass a count of exactly one.
        // The descriptor stays open for the duration of the call because `self` owns it.
        let rc = unsafe { libc::poll(&mut pfd, 1, millis) };

        match rc {
            0 => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "device not ready before timeout",
            )),
            n if n < 0 => Err(std::io::Error::last_os_error()),
            // POLLHUP/POLLERR fall through to the read/write, which reports EOF or the error.
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for DeviceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceStream")
            .field("type", &self.kind())
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}
