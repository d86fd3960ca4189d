use thiserror::Error;

/// Errors that can occur while recording or playing back audio.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("device error: {0}")]
    Device(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RecorderError {
    /// Whether this error originated in the device layer rather than
    /// in file i/o.
    pub fn is_device(&self) -> bool {
        matches!(self, Self::Device(_) | Self::Backend(_))
    }
}
