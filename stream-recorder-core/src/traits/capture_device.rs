use crate::models::error::RecorderError;

/// An open microphone stream, owned exclusively by one capture loop.
///
/// The handle is acquired at loop entry and released at loop exit on
/// every path; release happens in `Drop`, so a handle can never be
/// released twice or used after release. The underlying device APIs
/// are not safe for concurrent access, hence `Send` but not `Sync`:
/// the handle moves onto the worker thread and stays there.
pub trait CaptureDevice: Send {
    /// Begin delivering samples. Must be called before the first `read`.
    fn start(&mut self) -> Result<(), RecorderError>;

    /// Blocking read of up to `buf.len()` bytes of PCM into `buf`.
    ///
    /// Returns the number of bytes actually read. `Ok(0)` means the
    /// device produced no data and is treated by the capture loop the
    /// same as `Err`: the device has failed.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, RecorderError>;

    /// Stop delivering samples. Called before the handle is dropped;
    /// implementations must tolerate a `stop` after a failed `read`.
    fn stop(&mut self);
}
