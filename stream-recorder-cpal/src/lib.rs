//! # stream-recorder-cpal
//!
//! cpal backend for `stream-recorder-core`.
//!
//! cpal delivers and consumes audio through callbacks on its own
//! thread, while the core's loops expect blocking `read`/`write`
//! calls. Each device here bridges the two: a dedicated thread owns
//! the `cpal::Stream` (which is neither `Send` nor `Sync`), and bytes
//! cross between the callback and the blocking side through a channel
//! (capture) or a shared queue (playback).

pub mod capture;
pub mod factory;
pub mod playback;

mod pcm;

pub use capture::CpalCaptureDevice;
pub use factory::CpalDeviceFactory;
pub use playback::CpalPlaybackDevice;
