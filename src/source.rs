//! Frame sources.
//!
//! A [`FrameSource`] hands the detection session one decoded frame at a
//! time, in capture order, together with its timestamp and index.
//! `Ok(None)` marks the end of the stream; an `Err` aborts the session.
//!
//! [`MemorySource`] serves frames that are already decoded. File-backed
//! sources live in [`image_sequence`](crate::image_sequence) and, with the
//! `ffmpeg` feature, [`video`](crate::video).

use std::collections::VecDeque;
use std::time::Duration;

use crate::error::FadeError;
use crate::frame::FrameSample;

/// A decoded frame plus its position in the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFrame {
    /// Pixel data.
    pub sample: FrameSample,
    /// Presentation time relative to the start of the stream.
    pub timestamp: Duration,
    /// Zero-based position in capture order.
    pub frame_index: u64,
}

impl SourceFrame {
    /// Bundle a frame with its timestamp and index.
    pub fn new(sample: FrameSample, timestamp: Duration, frame_index: u64) -> Self {
        Self {
            sample,
            timestamp,
            frame_index,
        }
    }
}

/// Pull-based supplier of decoded frames.
pub trait FrameSource {
    /// Produce the next frame, `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// Any error is fatal to the session reading from this source. Retry
    /// policy, if any, belongs to the implementation.
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FadeError>;

    /// Number of frames the source expects to produce, if known.
    fn frame_count_hint(&self) -> Option<u64> {
        None
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FadeError> {
        (**self).next_frame()
    }

    fn frame_count_hint(&self) -> Option<u64> {
        (**self).frame_count_hint()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FadeError> {
        (**self).next_frame()
    }

    fn frame_count_hint(&self) -> Option<u64> {
        (**self).frame_count_hint()
    }
}

/// Timestamp of frame `index` in a constant-rate stream, rounded to the
/// nearest nanosecond.
pub(crate) fn frame_timestamp(index: u64, frames_per_second: f64) -> Duration {
    Duration::from_nanos((index as f64 * 1_000_000_000.0 / frames_per_second).round() as u64)
}

/// Frames held in memory.
///
/// # Example
///
/// ```
/// use fadescan::{FrameSample, FrameSource, MemorySource};
///
/// let frames = vec![FrameSample::filled(4, 4, 1, 0); 3];
/// let mut source = MemorySource::from_frames(frames, 25.0)?;
/// source.next_frame()?;
/// let second = source.next_frame()?.expect("three frames");
/// assert_eq!(second.frame_index, 1);
/// assert_eq!(second.timestamp.as_millis(), 40);
/// # Ok::<(), fadescan::FadeError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    frames: VecDeque<SourceFrame>,
}

impl MemorySource {
    /// Serve `frames` at a constant rate, indices starting at 0.
    ///
    /// # Errors
    ///
    /// Returns [`FadeError::InvalidConfig`] if `frames_per_second` is not a
    /// positive, finite number.
    pub fn from_frames(frames: Vec<FrameSample>, frames_per_second: f64) -> Result<Self, FadeError> {
        if !(frames_per_second.is_finite() && frames_per_second > 0.0) {
            return Err(FadeError::invalid_config(
                "frames_per_second",
                format!("must be positive and finite, got {frames_per_second}"),
            ));
        }

        let frames = frames
            .into_iter()
            .enumerate()
            .map(|(index, sample)| {
                SourceFrame::new(sample, frame_timestamp(index as u64, frames_per_second), index as u64)
            })
            .collect();

        Ok(Self { frames })
    }

    /// Serve frames whose timing is already known.
    pub fn from_timed(frames: Vec<SourceFrame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    /// Frames not yet handed out.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FadeError> {
        Ok(self.frames.pop_front())
    }

    fn frame_count_hint(&self) -> Option<u64> {
        Some(self.frames.len() as u64)
    }
}
