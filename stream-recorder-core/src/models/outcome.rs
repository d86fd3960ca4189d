/// How a capture loop terminated.
///
/// A closed set of variants in place of the device layer's mix of
/// negative sentinel codes and thrown errors: every exit path of the
/// loop maps to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The recording was kept. `seconds` is the elapsed wall-clock
    /// duration, truncated to whole seconds.
    Success { seconds: u64 },
    /// The recording ran under the minimum duration; the file was
    /// deleted. A policy outcome, not an execution failure.
    TooShort,
    /// The capture device failed (open, start, or a read that returned
    /// no data). The partial file is left on disk.
    DeviceError,
    /// File create/append failed.
    IoError,
}

impl CaptureOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// How a playback loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Success,
    /// Playback was requested before any recording succeeded; rejected
    /// before any device was opened.
    PreconditionFailed,
    /// The playback device reported an error code on write, or failed
    /// to open or start.
    DeviceError,
    /// Reading the recorded file failed.
    IoError,
}
