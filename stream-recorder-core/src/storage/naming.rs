use std::fs::{self, File};
use std::path::PathBuf;

use crate::models::config::StreamConfig;
use crate::models::error::RecorderError;

/// Kind of audio file, identified by its extension tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFileKind {
    /// Raw PCM samples, no container. Produced by the streaming
    /// capture loop.
    Pcm,
    /// Container format written by a platform codec (out of scope for
    /// the streaming pipeline, named here so both strategies share one
    /// naming scheme).
    M4a,
}

impl AudioFileKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pcm => "pcm",
            Self::M4a => "m4a",
        }
    }
}

/// Derive a destination path for a new recording and create the file.
///
/// Ensures the output directory exists first. The file stem is the
/// configured debug name when set, otherwise epoch milliseconds: a
/// collision-avoidance convenience, not a uniqueness guarantee.
pub fn create_audio_file(
    config: &StreamConfig,
    kind: AudioFileKind,
) -> Result<PathBuf, RecorderError> {
    fs::create_dir_all(&config.output_directory)?;

    let stem = match &config.debug_file_name {
        Some(name) => name.clone(),
        None => chrono::Utc::now().timestamp_millis().to_string(),
    };
    let path = config
        .output_directory
        .join(format!("{}.{}", stem, kind.extension()));

    File::create(&path)?;
    Ok(path)
}
