//! Blocking microphone capture over a cpal input stream.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use stream_recorder_core::models::error::RecorderError;
use stream_recorder_core::traits::capture_device::CaptureDevice;
use stream_recorder_core::StreamConfig;

use crate::pcm;

/// How long a `read` waits for the callback thread before concluding
/// the device has stalled.
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Blocking capture device bridging cpal's callback model.
///
/// `start` spawns a thread that owns the `cpal::Stream`; the input
/// callback forwards sample chunks over a channel, and `read` blocks
/// on that channel, carrying any surplus bytes over to the next call
/// so nothing is dropped between reads.
pub struct CpalCaptureDevice {
    config: StreamConfig,
    buffer_size: usize,
    data_rx: Option<Receiver<Vec<u8>>>,
    pending: VecDeque<u8>,
    shutdown: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl CpalCaptureDevice {
    pub(crate) fn new(config: StreamConfig, buffer_size: usize) -> Self {
        Self {
            config,
            buffer_size,
            data_rx: None,
            pending: VecDeque::new(),
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

    fn teardown(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
        self.data_rx = None;
    }
}

impl CaptureDevice for CpalCaptureDevice {
    fn start(&mut self) -> Result<(), RecorderError> {
        if self.thread.is_some() {
            return Err(RecorderError::Device("capture already started".into()));
        }

        let (data_tx, data_rx) = mpsc::channel::<Vec<u8>>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), RecorderError>>();
        let shutdown = Arc::clone(&self.shutdown);
        let stream_config = self.stream_config();

        let handle = thread::Builder::new()
            .name("cpal-capture".into())
            .spawn(move || {
                let built = (|| -> Result<cpal::Stream, RecorderError> {
                    let host = cpal::default_host();
                    let device = host
                        .default_input_device()
                        .ok_or_else(|| RecorderError::Device("no input device".into()))?;

                    let stream = device
                        .build_input_stream(
                            &stream_config,
                            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                                // Receiver gone means the handle was
                                // dropped; the stream is about to die too.
                                let _ = data_tx.send(pcm::samples_to_le_bytes(data));
                            },
                            |e| log::error!("capture stream error: {}", e),
                            None,
                        )
                        .map_err(|e| RecorderError::Device(e.to_string()))?;

                    stream.play().map_err(|e| RecorderError::Device(e.to_string()))?;
                    Ok(stream)
                })();

                match built {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        // The stream is !Send, so it parks here until
                        // the blocking side tears the device down.
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
            .map_err(|e| RecorderError::Backend(format!("failed to spawn capture thread: {}", e)))?;

        self.thread = Some(handle);

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.data_rx = Some(data_rx);
                Ok(())
            }
            Ok(Err(e)) => {
                self.teardown();
                Err(e)
            }
            Err(_) => {
                self.teardown();
                Err(RecorderError::Device("capture thread died during startup".into()))
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, RecorderError> {
        let Some(ref rx) = self.data_rx else {
            return Err(RecorderError::Device("capture not started".into()));
        };

        while self.pending.len() < buf.len() {
            match rx.recv_timeout(READ_TIMEOUT) {
                Ok(chunk) => self.pending.extend(chunk),
                // A stalled device delivers nothing within the timeout;
                // returning 0 tells the capture loop the device failed.
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(RecorderError::Device("capture stream closed".into()));
                }
            }
        }

        let n = buf.len().min(self.pending.len());
        for slot in buf[..n].iter_mut() {
            // The length check above guarantees n pops succeed.
            *slot = self.pending.pop_front().unwrap_or(0);
        }
        Ok(n)
    }

    fn stop(&mut self) {
        self.teardown();
    }
}

impl Drop for CpalCaptureDevice {
    fn drop(&mut self) {
        self.teardown();
    }
}
