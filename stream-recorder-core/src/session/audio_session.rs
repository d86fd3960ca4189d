use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::models::config::StreamConfig;
use crate::models::error::RecorderError;
use crate::models::outcome::{CaptureOutcome, PlaybackOutcome};
use crate::models::state::SessionState;
use crate::storage::naming::{self, AudioFileKind};
use crate::traits::device_factory::DeviceFactory;
use crate::traits::session_delegate::SessionDelegate;

use super::worker::SerialWorker;

/// State shared between the session facade and the loops running on
/// the worker thread.
struct Shared {
    state: Mutex<SessionState>,

    /// Stop flag for the capture loop, polled once per chunk. Stop
    /// latency is therefore bounded by one chunk's read time.
    recording: AtomicBool,

    /// Path of the last recording that survived the minimum-duration
    /// policy; the sole playback source. Not persisted across restarts.
    current_recording: Mutex<Option<PathBuf>>,

    /// Scratch buffer reused by both loops to avoid per-chunk
    /// allocation. The lock is held for a loop's entire run, so the
    /// lease moves wholesale between capture and playback; the state
    /// machine keeps them from overlapping in the first place.
    scratch: Mutex<Vec<u8>>,
}

/// A recording/playback session, scoped to one owning screen.
///
/// All device i/o runs on a dedicated [`SerialWorker`]; the owning
/// (UI) thread only flips flags, enqueues loop entries, and receives
/// delegate callbacks. Dropping the session force-stops any in-flight
/// loop and joins the worker, so no device handle outlives it.
pub struct AudioSession {
    config: StreamConfig,
    factory: Arc<dyn DeviceFactory>,
    delegate: Arc<dyn SessionDelegate>,
    shared: Arc<Shared>,
    worker: SerialWorker,
}

impl AudioSession {
    pub fn new(
        config: StreamConfig,
        factory: Arc<dyn DeviceFactory>,
        delegate: Arc<dyn SessionDelegate>,
    ) -> Result<Self, RecorderError> {
        config.validate().map_err(RecorderError::InvalidConfig)?;

        let shared = Arc::new(Shared {
            state: Mutex::new(SessionState::Idle),
            recording: AtomicBool::new(false),
            current_recording: Mutex::new(None),
            scratch: Mutex::new(vec![0u8; config.chunk_size]),
        });

        Ok(Self {
            config,
            factory,
            delegate,
            shared,
            worker: SerialWorker::new("audio-session"),
        })
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.lock()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Path of the current playback source, if a recording has
    /// succeeded.
    pub fn current_recording(&self) -> Option<PathBuf> {
        self.shared.current_recording.lock().clone()
    }

    /// Begin recording. A no-op unless the session is idle.
    ///
    /// The capture loop is enqueued on the worker; completion is
    /// reported through the delegate with the session back in idle.
    pub fn start_recording(&self) {
        {
            let mut state = self.shared.state.lock();
            if !state.try_begin_recording() {
                log::debug!("start_recording ignored in state {:?}", *state);
                return;
            }
        }
        self.shared.recording.store(true, Ordering::SeqCst);

        let config = self.config.clone();
        let factory = Arc::clone(&self.factory);
        let delegate = Arc::clone(&self.delegate);
        let shared = Arc::clone(&self.shared);

        self.worker.submit(move || {
            let outcome = run_capture(&config, factory.as_ref(), &shared);
            shared.recording.store(false, Ordering::SeqCst);
            shared.state.lock().finish();

            match outcome {
                CaptureOutcome::Success { seconds } => {
                    delegate.log_line(&format!("recorded {} s", seconds));
                }
                // A too-short recording is discarded silently.
                CaptureOutcome::TooShort => {}
                CaptureOutcome::DeviceError | CaptureOutcome::IoError => {
                    delegate.notice("recording failed");
                }
            }
            delegate.capture_finished(outcome);
        });
    }

    /// Signal the capture loop to stop after its current chunk.
    pub fn stop_recording(&self) {
        self.shared.recording.store(false, Ordering::SeqCst);
    }

    /// Begin playing the current recording. A no-op while recording or
    /// already playing; rejected with a notice if nothing has been
    /// recorded yet (no device is opened in that case).
    pub fn start_playback(&self) {
        let input = {
            let mut state = self.shared.state.lock();
            if !state.is_idle() {
                log::debug!("start_playback ignored in state {:?}", *state);
                return;
            }
            let Some(input) = self.shared.current_recording.lock().clone() else {
                drop(state);
                self.delegate.notice("record first");
                self.delegate
                    .playback_finished(PlaybackOutcome::PreconditionFailed);
                return;
            };
            if !state.try_begin_playback() {
                // Cannot happen while the lock is held; is_idle was
                // checked above.
                return;
            }
            input
        };

        let config = self.config.clone();
        let factory = Arc::clone(&self.factory);
        let delegate = Arc::clone(&self.delegate);
        let shared = Arc::clone(&self.shared);

        self.worker.submit(move || {
            let outcome = run_playback(&config, factory.as_ref(), &shared, delegate.as_ref(), &input);
            shared.state.lock().finish();
            delegate.playback_finished(outcome);
        });
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        // Teardown must not leak a device: clear the stop flag so an
        // in-flight capture loop exits at its next chunk, then join the
        // worker so both loops have released their handles before the
        // session is gone.
        self.shared.recording.store(false, Ordering::SeqCst);
        self.worker.shutdown();
    }
}

/// How the capture loop's streaming phase ended.
enum CaptureEnd {
    /// External stop observed; recording finalized normally.
    Stopped { seconds: u64 },
    /// The device returned no data or an error code mid-loop.
    DeviceFailed,
}

fn run_capture(config: &StreamConfig, factory: &dyn DeviceFactory, shared: &Shared) -> CaptureOutcome {
    let path = match naming::create_audio_file(config, AudioFileKind::Pcm) {
        Ok(path) => path,
        Err(e) => {
            log::error!("failed to create recording file: {}", e);
            return CaptureOutcome::IoError;
        }
    };

    // Lease the scratch buffer for the whole loop run.
    let mut scratch = shared.scratch.lock();

    match capture_into(config, factory, shared, &mut scratch, &path) {
        Ok(CaptureEnd::Stopped { seconds }) => {
            if seconds >= config.min_duration_secs {
                *shared.current_recording.lock() = Some(path);
                CaptureOutcome::Success { seconds }
            } else {
                if let Err(e) = fs::remove_file(&path) {
                    log::warn!("failed to delete short recording: {}", e);
                }
                CaptureOutcome::TooShort
            }
        }
        // Keep the partial file: unlike TooShort this is not a policy
        // rejection, and the captured audio may still be of use.
        Ok(CaptureEnd::DeviceFailed) => CaptureOutcome::DeviceError,
        Err(e) => {
            log::error!("recording failed: {}", e);
            if e.is_device() {
                CaptureOutcome::DeviceError
            } else {
                CaptureOutcome::IoError
            }
        }
    }
}

/// The streaming phase of the capture loop. The device handle lives
/// only inside this function, so every exit (normal stop, device
/// failure, `?` on file i/o) releases it exactly once on return.
fn capture_into(
    config: &StreamConfig,
    factory: &dyn DeviceFactory,
    shared: &Shared,
    scratch: &mut [u8],
    path: &Path,
) -> Result<CaptureEnd, RecorderError> {
    let buffer_size = factory.min_capture_buffer_size(config).max(scratch.len());
    let mut device = factory.open_capture(config, buffer_size)?;
    let mut out = File::options().write(true).truncate(true).open(path)?;

    device.start()?;
    let begin = Instant::now();

    while shared.recording.load(Ordering::SeqCst) {
        match device.read(scratch) {
            Ok(n) if n > 0 => out.write_all(&scratch[..n])?,
            Ok(_) => {
                device.stop();
                return Ok(CaptureEnd::DeviceFailed);
            }
            Err(e) => {
                log::error!("device read failed: {}", e);
                device.stop();
                return Ok(CaptureEnd::DeviceFailed);
            }
        }
    }

    device.stop();
    out.flush()?;

    // Truncating division: a 2.9 s recording counts as 2 s.
    let seconds = begin.elapsed().as_millis() as u64 / 1000;
    Ok(CaptureEnd::Stopped { seconds })
}

fn run_playback(
    config: &StreamConfig,
    factory: &dyn DeviceFactory,
    shared: &Shared,
    delegate: &dyn SessionDelegate,
    input: &Path,
) -> PlaybackOutcome {
    let mut scratch = shared.scratch.lock();

    match play_from(config, factory, &mut scratch, delegate, input) {
        Ok(false) => PlaybackOutcome::Success,
        Ok(true) => PlaybackOutcome::DeviceError,
        Err(e) => {
            log::error!("playback failed: {}", e);
            delegate.notice("playback failed");
            if e.is_device() {
                PlaybackOutcome::DeviceError
            } else {
                PlaybackOutcome::IoError
            }
        }
    }
}

/// Streams the recorded file into the playback device. Returns whether
/// the device reported an error code along the way.
///
/// A device error code is not an abort: it is reported once and the
/// file is drained to end of stream regardless (best-effort flush).
/// The input file and the device handle are both dropped on every exit
/// path. Closing happens in `File`'s drop, which discards any close
/// error; a read-only handle has nothing buffered to lose, so there is
/// nothing worth reporting.
fn play_from(
    config: &StreamConfig,
    factory: &dyn DeviceFactory,
    scratch: &mut [u8],
    delegate: &dyn SessionDelegate,
    input: &Path,
) -> Result<bool, RecorderError> {
    let buffer_size = factory.min_playback_buffer_size(config).max(scratch.len());
    let mut file = File::open(input)?;
    let mut device = factory.open_playback(config, buffer_size)?;

    device.start()?;

    let mut device_failed = false;
    loop {
        let n = file.read(scratch)?;
        if n == 0 {
            break;
        }
        if let Err(code) = device.write(&scratch[..n]) {
            if !device_failed {
                device_failed = true;
                log::error!("playback device write failed: {}", code);
                delegate.notice("playback failed");
            }
        }
    }

    device.stop();
    Ok(device_failed)
}
