//! Error types for the `fadescan` crate.
//!
//! This module defines [`FadeError`], the unified error type returned by all
//! fallible operations in the crate. Configuration and frame errors are
//! raised by the detection core; the remaining variants come from the frame
//! source adapters and are propagated verbatim, ending the session.

use std::{io::Error as IoError, path::PathBuf};

#[cfg(feature = "ffmpeg")]
use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `fadescan` operations.
///
/// Every public method that can fail returns `Result<T, FadeError>`.
/// End-of-stream is never an error: frame sources signal it with
/// `Ok(None)`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FadeError {
    /// A [`DetectionConfig`](crate::DetectionConfig) value is out of range.
    ///
    /// Raised before a session starts; no frames are read.
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig {
        /// Name of the offending setting.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A frame has zero samples or a buffer that does not match its
    /// declared dimensions.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// The frame source failed to produce the next frame.
    #[error("Failed to read frame from source: {0}")]
    SourceRead(String),

    /// An average frame rate was requested but no frames were processed or
    /// no time elapsed.
    #[error("Average frame rate is undefined (no frames or zero elapsed time)")]
    RateUndefined,

    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to the source constructor.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[cfg(feature = "ffmpeg")]
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading frames.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while decoding a still frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The session was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl FadeError {
    /// Shorthand for an [`InvalidConfig`](FadeError::InvalidConfig) error.
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        FadeError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "ffmpeg")]
impl From<FfmpegError> for FadeError {
    fn from(error: FfmpegError) -> Self {
        FadeError::FfmpegError(error.to_string())
    }
}
