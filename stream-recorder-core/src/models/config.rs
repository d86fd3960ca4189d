use std::path::PathBuf;

/// Configuration for a recording session.
///
/// One config drives both loops: capture and playback must agree on
/// sample rate, channel count, and sample format for the raw PCM file
/// to round-trip.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// Number of channels (default: 1, mono).
    pub channels: u16,

    /// Bit depth for PCM samples (default: 16).
    pub bit_depth: u16,

    /// Size in bytes of one chunk moved per device read/write
    /// (default: 2048). Also the capacity of the session's scratch
    /// buffer and the floor for the device buffer size.
    pub chunk_size: usize,

    /// Recordings shorter than this many whole seconds are discarded
    /// (default: 3).
    pub min_duration_secs: u64,

    /// Directory where recording files are written.
    pub output_directory: PathBuf,

    /// Fixed file stem for debug builds. When `None`, files are named
    /// by epoch milliseconds.
    pub debug_file_name: Option<String>,
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if ![1, 2].contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        if self.bit_depth != 16 {
            return Err(format!("unsupported bit depth: {}", self.bit_depth));
        }
        if self.chunk_size == 0 {
            return Err("chunk size must be positive".into());
        }
        Ok(())
    }

    /// Bytes per frame (all channels of one sample instant).
    pub fn frame_size(&self) -> usize {
        self.channels as usize * (self.bit_depth as usize / 8)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 1,
            bit_depth: 16,
            chunk_size: 2048,
            min_duration_secs: 3,
            output_directory: PathBuf::from("."),
            debug_file_name: if cfg!(debug_assertions) {
                Some("demo".into())
            } else {
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(StreamConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let config = StreamConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_odd_bit_depth() {
        let config = StreamConfig {
            bit_depth: 24,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn mono_16bit_frame_size() {
        assert_eq!(StreamConfig::default().frame_size(), 2);
    }
}
