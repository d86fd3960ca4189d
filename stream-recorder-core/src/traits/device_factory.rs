use crate::models::config::StreamConfig;
use crate::models::error::RecorderError;

use super::capture_device::CaptureDevice;
use super::playback_device::PlaybackDevice;

/// Interface for platform-specific audio backends.
///
/// The session asks the factory for a device minimum, takes the larger
/// of that and its scratch-buffer capacity, and opens the device with
/// the result. An undersized device buffer causes overruns; an
/// oversized one only adds latency.
///
/// Implemented by `CpalDeviceFactory` in `stream-recorder-cpal`, and by
/// mock factories in tests.
pub trait DeviceFactory: Send + Sync {
    /// Smallest device buffer (in bytes) the capture side will accept
    /// for this configuration.
    fn min_capture_buffer_size(&self, config: &StreamConfig) -> usize;

    /// Smallest device buffer (in bytes) the playback side will accept.
    fn min_playback_buffer_size(&self, config: &StreamConfig) -> usize;

    /// Open a microphone stream. The handle is exclusively owned by the
    /// caller until dropped.
    fn open_capture(
        &self,
        config: &StreamConfig,
        buffer_size: usize,
    ) -> Result<Box<dyn CaptureDevice>, RecorderError>;

    /// Open a speaker stream in streaming mode.
    fn open_playback(
        &self,
        config: &StreamConfig,
        buffer_size: usize,
    ) -> Result<Box<dyn PlaybackDevice>, RecorderError>;
}
