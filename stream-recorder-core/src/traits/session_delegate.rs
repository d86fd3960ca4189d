use crate::models::outcome::{CaptureOutcome, PlaybackOutcome};

/// Event delegate for session notifications.
///
/// All methods are called from the session's worker thread, never the
/// UI thread. Implementations marshal to their UI as needed; calls from
/// the same session arrive in FIFO order because the session runs on a
/// single serialized worker.
///
/// Passing the delegate into the session replaces the usual
/// global "post to main thread" singleton, so tests can substitute a
/// synchronous collector.
pub trait SessionDelegate: Send + Sync {
    /// A short, transient user-facing message (e.g. "recording failed").
    fn notice(&self, text: &str);

    /// A line for the session's running log (e.g. the duration of a
    /// completed recording).
    fn log_line(&self, text: &str);

    /// The capture loop finished, with any outcome. The session is back
    /// in the idle state when this fires.
    fn capture_finished(&self, outcome: CaptureOutcome);

    /// The playback loop finished, with any outcome.
    fn playback_finished(&self, outcome: PlaybackOutcome);
}
