//! # fadescan
//!
//! Detect fade-to-black and fade-from-black transitions in video streams.
//!
//! Every frame is classified as dark or lit by an adaptive block-sampled
//! threshold scan, and a small state machine turns the classification
//! sequence into timestamped [`FadeEvent`]s: a fade-in when the picture goes
//! to black and a fade-out when it comes back. Video decoding is powered by
//! FFmpeg via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)
//! crate; image sequences and in-memory frames need no FFmpeg at all.
//!
//! ## Quick Start
//!
//! ### Scan a Video File
//!
//! ```no_run
//! use fadescan::{DetectionConfig, VideoFileSource, detect_fades};
//!
//! let mut source = VideoFileSource::open("input.mp4").unwrap();
//! let (events, summary) = detect_fades(&mut source, DetectionConfig::new()).unwrap();
//! for event in &events {
//!     println!("Detected {} at {}ms (frame {})", event.kind, event.timestamp_ms(), event.frame_index);
//! }
//! println!("Read {} frames", summary.frames_processed);
//! ```
//!
//! ### Tune the Detector
//!
//! ```
//! use fadescan::{DetectionConfig, DetectionStrategy};
//!
//! let config = DetectionConfig::new()
//!     .with_intensity_threshold(24)
//!     .with_min_dark_percent(98.0)
//!     .with_block_rows(16)
//!     .with_strategy(DetectionStrategy::BlockSampled);
//! assert!(config.validate().is_ok());
//! ```
//!
//! ### Drive a Session by Hand
//!
//! ```
//! use std::time::Duration;
//!
//! use fadescan::{DetectionConfig, DetectionSession, FrameSample, SourceFrame};
//!
//! let mut session = DetectionSession::new(DetectionConfig::new())?;
//! let black = SourceFrame::new(FrameSample::filled(4, 4, 1, 0), Duration::ZERO, 0);
//! let event = session.process_frame(&black)?;
//! assert!(event.is_some());
//! # Ok::<(), fadescan::FadeError>(())
//! ```
//!
//! ## Features
//!
//! - **Early-exit scanning**: stops reading a frame as soon as it cannot be
//!   dark
//! - **Fade state tracking**: one event per dark/lit change, never for
//!   repeats
//! - **Pluggable sources**: FFmpeg video files, image sequences, in-memory
//!   frames, or any [`FrameSource`]
//! - **Progress & cancellation**: cooperative callbacks and
//!   `CancellationToken` for long-running scans
//! - **Timecodes**: `HH:MM:SS.mmm` formatting and parsing for split lists
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ffmpeg` | `VideoFileSource` for decoding video files (default) |
//! | `async` | `FadeEventStream` for async detection via Tokio |
//! | `rayon` | `detect_fades_parallel()` scans many files across rayon threads |
//! | `full` | Enables all of the above |

pub mod config;
#[cfg(feature = "ffmpeg")]
mod conversion;
pub mod error;
pub mod event;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod frame;
pub mod image_sequence;
pub mod progress;
#[cfg(feature = "rayon")]
mod rayon;
pub mod scanner;
pub mod session;
pub mod source;
pub mod stats;
#[cfg(feature = "async")]
pub mod stream;
pub mod timecode;
pub mod tracker;
#[cfg(feature = "ffmpeg")]
pub mod video;

pub use config::{
    DEFAULT_BLOCK_ROWS, DEFAULT_INTENSITY_THRESHOLD, DEFAULT_MIN_DARK_PERCENT, DetectionConfig,
    DetectionStrategy, SessionOptions,
};
pub use error::FadeError;
pub use event::{EventSink, FadeEvent, FadeKind};
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::FrameSample;
pub use image_sequence::ImageSequenceSource;
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
#[cfg(feature = "rayon")]
pub use crate::rayon::{FileDetection, detect_fades_parallel};
pub use scanner::{FrameClassification, ScanOutcome};
pub use session::{DetectionSession, detect_fades};
pub use source::{FrameSource, MemorySource, SourceFrame};
pub use stats::{SessionStats, SessionSummary};
#[cfg(feature = "async")]
pub use stream::FadeEventStream;
pub use timecode::{format_timecode, parse_timecode};
pub use tracker::{FadeState, FadeStateTracker};
#[cfg(feature = "ffmpeg")]
pub use video::{PixelFormat, VideoFileSource, VideoMetadata};
