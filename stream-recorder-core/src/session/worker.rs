use std::sync::mpsc::{self, Sender};
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A single-thread serialized task queue.
///
/// All device i/o runs here: the underlying device APIs are not safe
/// for concurrent access, and a single FIFO worker also guarantees
/// that a stop submitted after a start observes the loop already
/// running. Jobs submitted after shutdown are dropped.
pub struct SerialWorker {
    tx: Option<Sender<Job>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SerialWorker {
    pub fn new(name: &str) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    job();
                }
            })
            .expect("failed to spawn worker thread");

        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// Enqueue a job. FIFO relative to other submissions.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let sent = self
            .tx
            .as_ref()
            .is_some_and(|tx| tx.send(Box::new(job)).is_ok());
        if !sent {
            log::warn!("worker queue is shut down; job dropped");
        }
    }

    /// Stop accepting jobs, run what is already queued, and join the
    /// worker thread. Blocks until any in-flight job finishes.
    pub fn shutdown(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SerialWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
