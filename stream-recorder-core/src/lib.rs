//! # stream-recorder-core
//!
//! Platform-agnostic core of a PCM streaming recorder: pull raw
//! samples from a capture device into a file, later push them back
//! into a playback device, under a single idle/recording/playing
//! state machine.
//!
//! Platform backends implement the device traits and plug into the
//! generic `AudioSession`; `stream-recorder-cpal` provides one built
//! on cpal.
//!
//! ## Architecture
//!
//! ```text
//! stream-recorder-core (this crate)
//! ├── traits/       ← CaptureDevice, PlaybackDevice, DeviceFactory, SessionDelegate
//! ├── models/       ← RecorderError, SessionState, StreamConfig, outcome enums
//! ├── session/      ← AudioSession (capture/playback loops), SerialWorker
//! └── storage/      ← audio file naming
//! ```

pub mod models;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::StreamConfig;
pub use models::error::RecorderError;
pub use models::outcome::{CaptureOutcome, PlaybackOutcome};
pub use models::state::SessionState;
pub use session::audio_session::AudioSession;
pub use session::worker::SerialWorker;
pub use storage::naming::AudioFileKind;
pub use traits::capture_device::CaptureDevice;
pub use traits::device_factory::DeviceFactory;
pub use traits::playback_device::{PlaybackDevice, PlaybackWriteError};
pub use traits::session_delegate::SessionDelegate;
