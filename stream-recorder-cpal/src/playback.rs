//! Blocking speaker playback over a cpal output stream.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;

use stream_recorder_core::models::error::RecorderError;
use stream_recorder_core::traits::playback_device::{PlaybackDevice, PlaybackWriteError};
use stream_recorder_core::StreamConfig;

use crate::pcm;

/// Upper bound on how long `stop` waits for queued audio to drain.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Upper bound on how long one `write` blocks on backpressure before
/// concluding the device has stopped consuming. Counterpart of the
/// capture side's read timeout: a stalled stream must not wedge the
/// playback loop, or session teardown could never join the worker.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Block until the queue falls to `high_water` or below.
///
/// Returns `DeadObject` if the stream has reported an error or the
/// queue has not drained within `timeout`; a silently stalled device
/// never fires the error callback, so the deadline is the only exit.
fn await_drain(
    queue: &Mutex<VecDeque<u8>>,
    failed: &AtomicBool,
    high_water: usize,
    timeout: Duration,
) -> Result<(), PlaybackWriteError> {
    let deadline = Instant::now() + timeout;
    while queue.lock().len() > high_water {
        if failed.load(Ordering::SeqCst) || Instant::now() >= deadline {
            return Err(PlaybackWriteError::DeadObject);
        }
        thread::sleep(Duration::from_millis(1));
    }
    Ok(())
}

/// Blocking playback device bridging cpal's callback model.
///
/// `write` appends LE PCM bytes to a shared queue; the output callback
/// pops samples from it, substituting silence when the queue runs dry.
/// Writes block once the queue holds a few device buffers' worth of
/// audio, so a fast file read cannot balloon memory.
pub struct CpalPlaybackDevice {
    config: StreamConfig,
    buffer_size: usize,
    queue: Arc<Mutex<VecDeque<u8>>>,
    failed: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl CpalPlaybackDevice {
    pub(crate) fn new(config: StreamConfig, buffer_size: usize) -> Self {
        Self {
            config,
            buffer_size,
            queue: Arc::new(Mutex::new(VecDeque::new())),
            failed: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    fn stream_config(&self) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels: self.config.channels,
            sample_rate: cpal::SampleRate(self.config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(
                (self.buffer_size / self.config.frame_size()) as cpal::FrameCount,
            ),
        }
    }

    /// Queue level above which `write` blocks.
    fn high_water(&self) -> usize {
        self.buffer_size * 4
    }

    fn teardown(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl PlaybackDevice for CpalPlaybackDevice {
    fn start(&mut self) -> Result<(), RecorderError> {
        if self.thread.is_some() {
            return Err(RecorderError::Device("playback already started".into()));
        }

        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), RecorderError>>();
        let queue = Arc::clone(&self.queue);
        let failed = Arc::clone(&self.failed);
        let shutdown = Arc::clone(&self.shutdown);
        let stream_config = self.stream_config();

        let handle = thread::Builder::new()
            .name("cpal-playback".into())
            .spawn(move || {
                let built = (|| -> Result<cpal::Stream, RecorderError> {
                    let host = cpal::default_host();
                    let device = host
                        .default_output_device()
                        .ok_or_else(|| RecorderError::Device("no output device".into()))?;

                    let callback_queue = Arc::clone(&queue);
                    let callback_failed = Arc::clone(&failed);
                    let stream = device
                        .build_output_stream(
                            &stream_config,
                            move |out: &mut [i16], _: &cpal::OutputCallbackInfo| {
                                let mut queue = callback_queue.lock();
                                for slot in out.iter_mut() {
                                    *slot = pcm::pop_sample(&mut queue);
                                }
                            },
                            move |e| {
                                log::error!("playback stream error: {}", e);
                                callback_failed.store(true, Ordering::SeqCst);
                            },
                            None,
                        )
                        .map_err(|e| RecorderError::Device(e.to_string()))?;

                    stream.play().map_err(|e| RecorderError::Device(e.to_string()))?;
                    Ok(stream)
                })();

                match built {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        while !shutdown.load(Ordering::SeqCst) {
                            thread::sleep(Duration::from_millis(10));
                        }
                        drop(stream);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|e| RecorderError::Backend(format!("failed to spawn playback thread: {}", e)))?;

        self.thread = Some(handle);

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                self.teardown();
                Err(e)
            }
            Err(_) => {
                self.teardown();
                Err(RecorderError::Device("playback thread died during startup".into()))
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, PlaybackWriteError> {
        if self.thread.is_none() {
            return Err(PlaybackWriteError::InvalidOperation);
        }
        if buf.is_empty() {
            return Err(PlaybackWriteError::BadValue);
        }

        // Backpressure: let the callback catch up before queueing more.
        await_drain(&self.queue, &self.failed, self.high_water(), WRITE_TIMEOUT)?;

        if self.failed.load(Ordering::SeqCst) {
            return Err(PlaybackWriteError::DeadObject);
        }

        self.queue.lock().extend(buf.iter().copied());
        Ok(buf.len())
    }

    fn stop(&mut self) {
        // Let queued audio drain before killing the stream, bounded in
        // case the device has stopped consuming.
        let deadline = Instant::now() + DRAIN_TIMEOUT;
        while !self.queue.lock().is_empty()
            && !self.failed.load(Ordering::SeqCst)
            && Instant::now() < deadline
        {
            thread::sleep(Duration::from_millis(10));
        }
        self.teardown();
    }
}

impl Drop for CpalPlaybackDevice {
    fn drop(&mut self) {
        self.teardown();
    }
}
