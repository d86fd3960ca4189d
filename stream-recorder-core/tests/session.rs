//! End-to-end session scenarios driven by mock devices.
//!
//! The mock factory counts handle acquisitions and releases so every
//! scenario can assert that no device outlives its loop, whatever the
//! outcome.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use stream_recorder_core::{
    AudioSession, CaptureDevice, CaptureOutcome, DeviceFactory, PlaybackDevice, PlaybackOutcome,
    PlaybackWriteError, RecorderError, SessionDelegate, StreamConfig,
};

/// How long one mock device read blocks, i.e. the chunk cadence.
const READ_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Default)]
struct FactoryCounters {
    capture_opened: AtomicUsize,
    capture_released: AtomicUsize,
    playback_opened: AtomicUsize,
    playback_released: AtomicUsize,
    bytes_produced: AtomicUsize,
}

/// Mock backend. Capture produces a deterministic rolling byte pattern;
/// playback collects everything written to it.
struct MockFactory {
    counters: Arc<FactoryCounters>,
    /// Fail the Nth capture read (0-based) with a device error.
    fail_read_at: Option<usize>,
    /// Return a device error code from the Nth playback write onwards.
    fail_write_at: Option<usize>,
    played: Arc<Mutex<Vec<u8>>>,
}

impl MockFactory {
    fn new() -> Self {
        Self {
            counters: Arc::new(FactoryCounters::default()),
            fail_read_at: None,
            fail_write_at: None,
            played: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl DeviceFactory for MockFactory {
    fn min_capture_buffer_size(&self, config: &StreamConfig) -> usize {
        config.chunk_size / 2
    }

    fn min_playback_buffer_size(&self, config: &StreamConfig) -> usize {
        config.chunk_size / 2
    }

    fn open_capture(
        &self,
        _config: &StreamConfig,
        _buffer_size: usize,
    ) -> Result<Box<dyn CaptureDevice>, RecorderError> {
        self.counters.capture_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCapture {
            counters: Arc::clone(&self.counters),
            fail_read_at: self.fail_read_at,
            reads: 0,
            next_byte: 0,
        }))
    }

    fn open_playback(
        &self,
        _config: &StreamConfig,
        _buffer_size: usize,
    ) -> Result<Box<dyn PlaybackDevice>, RecorderError> {
        self.counters.playback_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPlayback {
            counters: Arc::clone(&self.counters),
            fail_write_at: self.fail_write_at,
            writes: 0,
            sink: Arc::clone(&self.played),
        }))
    }
}

struct MockCapture {
    counters: Arc<FactoryCounters>,
    fail_read_at: Option<usize>,
    reads: usize,
    next_byte: u8,
}

impl CaptureDevice for MockCapture {
    fn start(&mut self) -> Result<(), RecorderError> {
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, RecorderError> {
        thread::sleep(READ_INTERVAL);
        if self.fail_read_at == Some(self.reads) {
            return Err(RecorderError::Device("simulated read failure".into()));
        }
        self.reads += 1;
        for slot in buf.iter_mut() {
            *slot = self.next_byte;
            self.next_byte = self.next_byte.wrapping_add(1);
        }
        self.counters
            .bytes_produced
            .fetch_add(buf.len(), Ordering::SeqCst);
        Ok(buf.len())
    }

    fn stop(&mut self) {}
}

impl Drop for MockCapture {
    fn drop(&mut self) {
        self.counters.capture_released.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockPlayback {
    counters: Arc<FactoryCounters>,
    fail_write_at: Option<usize>,
    writes: usize,
    sink: Arc<Mutex<Vec<u8>>>,
}

impl PlaybackDevice for MockPlayback {
    fn start(&mut self) -> Result<(), RecorderError> {
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, PlaybackWriteError> {
        let write_index = self.writes;
        self.writes += 1;
        self.sink.lock().extend_from_slice(buf);
        if self.fail_write_at.is_some_and(|at| write_index >= at) {
            return Err(PlaybackWriteError::DeadObject);
        }
        Ok(buf.len())
    }

    fn stop(&mut self) {}
}

impl Drop for MockPlayback {
    fn drop(&mut self) {
        self.counters.playback_released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Delegate that records everything and signals loop completions over
/// channels so tests can wait without polling.
struct RecordingDelegate {
    notices: Mutex<Vec<String>>,
    log_lines: Mutex<Vec<String>>,
    capture_tx: Sender<CaptureOutcome>,
    playback_tx: Sender<PlaybackOutcome>,
}

impl RecordingDelegate {
    fn new() -> (Arc<Self>, Receiver<CaptureOutcome>, Receiver<PlaybackOutcome>) {
        let (capture_tx, capture_rx) = mpsc::channel();
        let (playback_tx, playback_rx) = mpsc::channel();
        let delegate = Arc::new(Self {
            notices: Mutex::new(Vec::new()),
            log_lines: Mutex::new(Vec::new()),
            capture_tx,
            playback_tx,
        });
        (delegate, capture_rx, playback_rx)
    }
}

impl SessionDelegate for RecordingDelegate {
    fn notice(&self, text: &str) {
        self.notices.lock().push(text.to_string());
    }

    fn log_line(&self, text: &str) {
        self.log_lines.lock().push(text.to_string());
    }

    fn capture_finished(&self, outcome: CaptureOutcome) {
        let _ = self.capture_tx.send(outcome);
    }

    fn playback_finished(&self, outcome: PlaybackOutcome) {
        let _ = self.playback_tx.send(outcome);
    }
}

struct Fixture {
    session: AudioSession,
    counters: Arc<FactoryCounters>,
    played: Arc<Mutex<Vec<u8>>>,
    delegate: Arc<RecordingDelegate>,
    capture_rx: Receiver<CaptureOutcome>,
    playback_rx: Receiver<PlaybackOutcome>,
    file_path: PathBuf,
    _tmp: tempfile::TempDir,
}

fn fixture_with(factory: MockFactory) -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let config = StreamConfig {
        chunk_size: 64,
        // Scenarios run at test speed: one second stands in for the
        // production three-second minimum.
        min_duration_secs: 1,
        output_directory: tmp.path().to_path_buf(),
        debug_file_name: Some("take".into()),
        ..Default::default()
    };
    let file_path = tmp.path().join("take.pcm");

    let counters = Arc::clone(&factory.counters);
    let played = Arc::clone(&factory.played);
    let (delegate, capture_rx, playback_rx) = RecordingDelegate::new();

    let session = AudioSession::new(config, Arc::new(factory), delegate.clone()).unwrap();

    Fixture {
        session,
        counters,
        played,
        delegate,
        capture_rx,
        playback_rx,
        file_path,
        _tmp: tmp,
    }
}

fn fixture() -> Fixture {
    fixture_with(MockFactory::new())
}

const WAIT: Duration = Duration::from_secs(5);

impl Fixture {
    fn record_for(&self, duration: Duration) -> CaptureOutcome {
        self.session.start_recording();
        thread::sleep(duration);
        self.session.stop_recording();
        self.capture_rx.recv_timeout(WAIT).expect("capture loop did not finish")
    }
}

#[test]
fn long_recording_is_kept_with_duration_log() {
    let fx = fixture();

    let outcome = fx.record_for(Duration::from_millis(1300));

    assert_eq!(outcome, CaptureOutcome::Success { seconds: 1 });
    assert!(fx.file_path.exists());
    assert_eq!(
        std::fs::metadata(&fx.file_path).unwrap().len() as usize,
        fx.counters.bytes_produced.load(Ordering::SeqCst),
    );
    assert_eq!(*fx.delegate.log_lines.lock(), vec!["recorded 1 s"]);
    assert!(fx.delegate.notices.lock().is_empty());
    assert_eq!(fx.session.current_recording(), Some(fx.file_path.clone()));
}

#[test]
fn short_recording_is_deleted_silently() {
    let fx = fixture();

    let outcome = fx.record_for(Duration::from_millis(150));

    assert_eq!(outcome, CaptureOutcome::TooShort);
    assert!(!fx.file_path.exists());
    assert!(fx.delegate.log_lines.lock().is_empty());
    assert!(fx.delegate.notices.lock().is_empty());
    assert_eq!(fx.session.current_recording(), None);
}

#[test]
fn capture_device_is_released_on_every_outcome() {
    // Success path.
    let fx = fixture();
    fx.record_for(Duration::from_millis(1200));
    assert_eq!(fx.counters.capture_opened.load(Ordering::SeqCst), 1);
    assert_eq!(fx.counters.capture_released.load(Ordering::SeqCst), 1);

    // TooShort path.
    let fx = fixture();
    fx.record_for(Duration::from_millis(100));
    assert_eq!(fx.counters.capture_released.load(Ordering::SeqCst), 1);

    // DeviceError path.
    let mut factory = MockFactory::new();
    factory.fail_read_at = Some(2);
    let fx = fixture_with(factory);
    fx.session.start_recording();
    let outcome = fx.capture_rx.recv_timeout(WAIT).unwrap();
    assert_eq!(outcome, CaptureOutcome::DeviceError);
    assert_eq!(fx.counters.capture_released.load(Ordering::SeqCst), 1);
}

#[test]
fn read_failure_aborts_but_keeps_partial_file() {
    let mut factory = MockFactory::new();
    factory.fail_read_at = Some(3);
    let fx = fixture_with(factory);

    fx.session.start_recording();
    let outcome = fx.capture_rx.recv_timeout(WAIT).unwrap();

    assert_eq!(outcome, CaptureOutcome::DeviceError);
    // Three successful chunk reads landed in the file before the abort;
    // a device failure does not trigger the too-short cleanup.
    assert!(fx.file_path.exists());
    assert_eq!(
        std::fs::metadata(&fx.file_path).unwrap().len() as usize,
        fx.counters.bytes_produced.load(Ordering::SeqCst),
    );
    assert_eq!(*fx.delegate.notices.lock(), vec!["recording failed"]);
    // A failed recording never becomes the playback source.
    assert_eq!(fx.session.current_recording(), None);
}

#[test]
fn playback_without_recording_is_rejected_before_opening_a_device() {
    let fx = fixture();

    fx.session.start_playback();
    let outcome = fx.playback_rx.recv_timeout(WAIT).unwrap();

    assert_eq!(outcome, PlaybackOutcome::PreconditionFailed);
    assert_eq!(*fx.delegate.notices.lock(), vec!["record first"]);
    assert_eq!(fx.counters.playback_opened.load(Ordering::SeqCst), 0);
}

#[test]
fn round_trip_preserves_order_and_length() {
    let fx = fixture();
    fx.record_for(Duration::from_millis(1200));

    fx.session.start_playback();
    let outcome = fx.playback_rx.recv_timeout(WAIT).unwrap();

    assert_eq!(outcome, PlaybackOutcome::Success);
    let recorded = std::fs::read(&fx.file_path).unwrap();
    assert_eq!(*fx.played.lock(), recorded);
    assert_eq!(fx.counters.playback_opened.load(Ordering::SeqCst), 1);
    assert_eq!(fx.counters.playback_released.load(Ordering::SeqCst), 1);
}

#[test]
fn playback_write_error_is_reported_once_but_drains_the_file() {
    let mut factory = MockFactory::new();
    factory.fail_write_at = Some(0);
    let fx = fixture_with(factory);
    fx.record_for(Duration::from_millis(1200));

    fx.session.start_playback();
    let outcome = fx.playback_rx.recv_timeout(WAIT).unwrap();

    assert_eq!(outcome, PlaybackOutcome::DeviceError);
    // Every write failed, yet the whole file was still pushed through.
    let recorded = std::fs::read(&fx.file_path).unwrap();
    assert_eq!(fx.played.lock().len(), recorded.len());
    // One notice despite many failing writes.
    assert_eq!(*fx.delegate.notices.lock(), vec!["playback failed"]);
    assert_eq!(fx.counters.playback_released.load(Ordering::SeqCst), 1);
}

#[test]
fn start_recording_while_recording_is_a_no_op() {
    let fx = fixture();

    fx.session.start_recording();
    thread::sleep(Duration::from_millis(50));
    fx.session.start_recording();
    fx.session.start_recording();
    thread::sleep(Duration::from_millis(50));
    fx.session.stop_recording();

    let _ = fx.capture_rx.recv_timeout(WAIT).unwrap();
    assert_eq!(fx.counters.capture_opened.load(Ordering::SeqCst), 1);
    assert!(fx.capture_rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn playback_while_recording_is_a_no_op() {
    let fx = fixture();
    fx.record_for(Duration::from_millis(1200));

    fx.session.start_recording();
    thread::sleep(Duration::from_millis(50));
    fx.session.start_playback();
    fx.session.stop_recording();

    let _ = fx.capture_rx.recv_timeout(WAIT).unwrap();
    assert_eq!(fx.counters.playback_opened.load(Ordering::SeqCst), 0);
}

#[test]
fn file_create_failure_reports_io_error_without_opening_a_device() {
    // A regular file where the output directory should go makes
    // create_audio_file fail before any device is acquired.
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("audio");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let factory = MockFactory::new();
    let counters = Arc::clone(&factory.counters);
    let (delegate, capture_rx, _playback_rx) = RecordingDelegate::new();
    let config = StreamConfig {
        chunk_size: 64,
        min_duration_secs: 1,
        output_directory: blocker.join("recordings"),
        debug_file_name: Some("take".into()),
        ..Default::default()
    };
    let session = AudioSession::new(config, Arc::new(factory), delegate.clone()).unwrap();

    session.start_recording();
    let outcome = capture_rx.recv_timeout(WAIT).unwrap();

    assert_eq!(outcome, CaptureOutcome::IoError);
    assert_eq!(*delegate.notices.lock(), vec!["recording failed"]);
    assert_eq!(counters.capture_opened.load(Ordering::SeqCst), 0);
    // The session is reusable afterwards.
    assert!(session.state().is_idle());
}

#[test]
fn missing_recording_file_reports_io_error_without_opening_a_device() {
    let fx = fixture();
    fx.record_for(Duration::from_millis(1200));

    // The recording vanishes between capture and playback; opening the
    // input fails before the playback device is acquired.
    std::fs::remove_file(&fx.file_path).unwrap();
    fx.session.start_playback();
    let outcome = fx.playback_rx.recv_timeout(WAIT).unwrap();

    assert_eq!(outcome, PlaybackOutcome::IoError);
    assert!(fx
        .delegate
        .notices
        .lock()
        .contains(&"playback failed".to_string()));
    assert_eq!(fx.counters.playback_opened.load(Ordering::SeqCst), 0);
    assert_eq!(fx.counters.playback_released.load(Ordering::SeqCst), 0);
    assert!(fx.session.state().is_idle());
}

#[test]
fn dropping_the_session_stops_capture_and_releases_the_device() {
    let fx = fixture();

    fx.session.start_recording();
    thread::sleep(Duration::from_millis(100));

    let counters = Arc::clone(&fx.counters);
    drop(fx.session);

    // Drop joined the worker, so the loop has fully unwound by now.
    assert_eq!(counters.capture_opened.load(Ordering::SeqCst), 1);
    assert_eq!(counters.capture_released.load(Ordering::SeqCst), 1);
}
