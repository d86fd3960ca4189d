use thiserror::Error;

use crate::models::error::RecorderError;

/// Error codes a playback device can return from `write`.
///
/// These mirror the sentinel codes of stream-mode playback APIs: the
/// device object is unusable, but no panic or i/o error occurred, so
/// the playback loop reports the failure once and keeps draining the
/// file (best-effort flush rather than hard abort).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackWriteError {
    #[error("invalid operation")]
    InvalidOperation,

    #[error("bad value")]
    BadValue,

    #[error("dead object")]
    DeadObject,
}

/// An open speaker stream, owned exclusively by one playback loop.
///
/// Same ownership discipline as [`CaptureDevice`](super::capture_device::CaptureDevice):
/// acquired at loop entry, released via `Drop` at loop exit on every
/// path.
pub trait PlaybackDevice: Send {
    /// Begin consuming samples. Must be called before the first `write`.
    fn start(&mut self) -> Result<(), RecorderError>;

    /// Write exactly `buf.len()` bytes of PCM to the device, blocking
    /// as needed. Returns the number of bytes accepted, or a device
    /// error code.
    fn write(&mut self, buf: &[u8]) -> Result<usize, PlaybackWriteError>;

    /// Stop consuming samples, letting queued audio drain first.
    fn stop(&mut self);
}
