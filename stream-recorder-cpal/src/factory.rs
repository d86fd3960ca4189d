//! `DeviceFactory` implementation over the default cpal host.

use cpal::traits::{DeviceTrait, HostTrait};

use stream_recorder_core::models::error::RecorderError;
use stream_recorder_core::traits::capture_device::CaptureDevice;
use stream_recorder_core::traits::device_factory::DeviceFactory;
use stream_recorder_core::traits::playback_device::PlaybackDevice;
use stream_recorder_core::StreamConfig;

use crate::capture::CpalCaptureDevice;
use crate::playback::CpalPlaybackDevice;

/// Opens capture and playback devices on the system default host.
///
/// Device minimums come from the default device's reported buffer-size
/// range; when a device reports no range the fallback is 100 ms of
/// audio at the configured format.
#[derive(Debug, Default)]
pub struct CpalDeviceFactory;

impl CpalDeviceFactory {
    pub fn new() -> Self {
        Self
    }

    fn fallback_min(config: &StreamConfig) -> usize {
        config.sample_rate as usize * config.frame_size() / 10
    }

    /// The only sample format these devices speak is 16-bit integer.
    fn check_format(config: &StreamConfig) -> Result<(), RecorderError> {
        if config.bit_depth != 16 {
            return Err(RecorderError::InvalidConfig(format!(
                "cpal backend supports 16-bit PCM only, got {}-bit",
                config.bit_depth
            )));
        }
        Ok(())
    }
}

impl DeviceFactory for CpalDeviceFactory {
    fn min_capture_buffer_size(&self, config: &StreamConfig) -> usize {
        cpal::default_host()
            .default_input_device()
            .and_then(|device| device.default_input_config().ok())
            .and_then(|supported| match supported.buffer_size() {
                cpal::SupportedBufferSize::Range { min, .. } => {
                    Some(*min as usize * config.frame_size())
                }
                cpal::SupportedBufferSize::Unknown => None,
            })
            .unwrap_or_else(|| Self::fallback_min(config))
    }

    fn min_playback_buffer_size(&self, config: &StreamConfig) -> usize {
        cpal::default_host()
            .default_output_device()
            .and_then(|device| device.default_output_config().ok())
            .and_then(|supported| match supported.buffer_size() {
                cpal::SupportedBufferSize::Range { min, .. } => {
                    Some(*min as usize * config.frame_size())
                }
                cpal::SupportedBufferSize::Unknown => None,
            })
            .unwrap_or_else(|| Self::fallback_min(config))
    }

    fn open_capture(
        &self,
        config: &StreamConfig,
        buffer_size: usize,
    ) -> Result<Box<dyn CaptureDevice>, RecorderError> {
        Self::check_format(config)?;
        Ok(Box::new(CpalCaptureDevice::new(config.clone(), buffer_size)))
    }

    fn open_playback(
        &self,
        config: &StreamConfig,
        buffer_size: usize,
    ) -> Result<Box<dyn PlaybackDevice>, RecorderError> {
        Self::check_format(config)?;
        Ok(Box::new(CpalPlaybackDevice::new(config.clone(), buffer_size)))
    }
}
