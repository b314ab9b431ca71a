//! Detection and session configuration.
//!
//! [`DetectionConfig`] holds the thresholds that decide whether a frame is
//! dark. [`SessionOptions`] is a builder that threads progress callbacks,
//! cancellation tokens, and loop bounds through a
//! [`DetectionSession`](crate::DetectionSession) without polluting its
//! signature.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use fadescan::{CancellationToken, DetectionConfig, ProgressCallback, ProgressInfo, SessionOptions};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{} frames", info.frames_processed);
//!     }
//! }
//!
//! let config = DetectionConfig::new()
//!     .with_intensity_threshold(8)
//!     .with_min_dark_percent(95.0)
//!     .with_block_rows(32);
//! config.validate()?;
//!
//! let token = CancellationToken::new();
//! let options = SessionOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_batch_size(25);
//! # Ok::<(), fadescan::FadeError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::error::FadeError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::tracker::FadeState;

/// Default 8-bit intensity cut-off.
pub const DEFAULT_INTENSITY_THRESHOLD: u32 = 16;
/// Default share of samples that must be at or below the threshold.
pub const DEFAULT_MIN_DARK_PERCENT: f64 = 95.0;
/// Default number of rows scanned between early-exit checks.
pub const DEFAULT_BLOCK_ROWS: usize = 32;

/// How a frame is reduced to a dark/lit decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionStrategy {
    /// Count samples above the threshold in row blocks, stopping as soon as
    /// too many lit samples have been seen. This is the default.
    #[default]
    BlockSampled,
    /// Compare the mean intensity of the whole frame against the threshold.
    ///
    /// `min_dark_percent` and `block_rows` are ignored.
    MeanIntensity,
}

/// Thresholds that classify a single frame as dark or lit.
///
/// All setters are unchecked; call [`validate`](DetectionConfig::validate)
/// (or construct a [`DetectionSession`](crate::DetectionSession), which
/// validates) before use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionConfig {
    pub(crate) intensity_threshold: u32,
    pub(crate) min_dark_percent: f64,
    pub(crate) block_rows: usize,
    pub(crate) strategy: DetectionStrategy,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            intensity_threshold: DEFAULT_INTENSITY_THRESHOLD,
            min_dark_percent: DEFAULT_MIN_DARK_PERCENT,
            block_rows: DEFAULT_BLOCK_ROWS,
            strategy: DetectionStrategy::BlockSampled,
        }
    }
}

impl DetectionConfig {
    /// Create a configuration with the defaults: threshold 16, 95% dark,
    /// 32-row blocks, block-sampled strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the 8-bit intensity cut-off (0–255). Samples strictly above it
    /// count as lit.
    #[must_use]
    pub fn with_intensity_threshold(mut self, threshold: u32) -> Self {
        self.intensity_threshold = threshold;
        self
    }

    /// Set the percentage (0–100) of samples that must be at or below the
    /// threshold for a frame to be dark.
    #[must_use]
    pub fn with_min_dark_percent(mut self, percent: f64) -> Self {
        self.min_dark_percent = percent;
        self
    }

    /// Set how many rows are scanned between early-exit checks.
    #[must_use]
    pub fn with_block_rows(mut self, rows: usize) -> Self {
        self.block_rows = rows;
        self
    }

    /// Set the classification strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: DetectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The intensity cut-off.
    pub fn intensity_threshold(&self) -> u32 {
        self.intensity_threshold
    }

    /// The minimum dark percentage.
    pub fn min_dark_percent(&self) -> f64 {
        self.min_dark_percent
    }

    /// Rows per scan block.
    pub fn block_rows(&self) -> usize {
        self.block_rows
    }

    /// The classification strategy.
    pub fn strategy(&self) -> DetectionStrategy {
        self.strategy
    }

    /// `min_dark_percent` as a fraction in `0.0..=1.0`.
    pub fn min_dark_fraction(&self) -> f64 {
        self.min_dark_percent / 100.0
    }

    /// Largest number of lit samples a frame of `total_samples` may contain
    /// and still be dark.
    ///
    /// Computed from the lit percentage directly, so whole-number percents
    /// give an exact budget (90% of 10 samples allows exactly 1).
    pub fn max_lit_samples(&self, total_samples: usize) -> f64 {
        total_samples as f64 * (100.0 - self.min_dark_percent) / 100.0
    }

    /// Check every value against its allowed range.
    ///
    /// Validation has no side effects; calling it repeatedly on the same
    /// configuration always gives the same answer.
    ///
    /// # Errors
    ///
    /// Returns [`FadeError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), FadeError> {
        if self.intensity_threshold > u8::MAX as u32 {
            return Err(FadeError::invalid_config(
                "intensity_threshold",
                format!("must be between 0 and 255, got {}", self.intensity_threshold),
            ));
        }

        if !(0.0..=100.0).contains(&self.min_dark_percent) {
            return Err(FadeError::invalid_config(
                "min_dark_percent",
                format!("must be between 0 and 100, got {}", self.min_dark_percent),
            ));
        }

        if self.block_rows == 0 {
            return Err(FadeError::invalid_config(
                "block_rows",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}

/// Operational settings for a detection session.
///
/// Carries optional progress-, cancellation-, and loop-bound settings. All
/// fields have sensible defaults: a default-constructed value reports
/// nothing, is never cancelled, and reads the source to its end.
#[derive(Clone)]
pub struct SessionOptions {
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
    /// Stop normally after this many frames.
    pub(crate) max_frames: Option<u64>,
    /// Stop normally at the first frame timestamped after this.
    pub(crate) end_time: Option<Duration>,
    /// Expected frame count, used for progress percentages.
    pub(crate) expected_frames: Option<u64>,
    /// State the tracker assumes for the frame before the first one.
    pub(crate) initial_state: FadeState,
}

impl Debug for SessionOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SessionOptions")
            .field("has_progress", &true)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("max_frames", &self.max_frames)
            .field("end_time", &self.end_time)
            .field("expected_frames", &self.expected_frames)
            .field("initial_state", &self.initial_state)
            .finish()
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionOptions {
    /// Create options with default settings.
    ///
    /// Defaults: no progress callback, no cancellation, batch size 1, no
    /// frame bound, tracker starting in [`FadeState::Lit`].
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            max_frames: None,
            end_time: None,
            expected_frames: None,
            initial_state: FadeState::Lit,
        }
    }

    /// Attach a progress callback.
    ///
    /// The callback is invoked every [`batch_size`](SessionOptions::with_batch_size)
    /// frames and once more when the session finishes.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// The token is checked between frames. When it is cancelled the
    /// session stops and returns [`FadeError::Cancelled`]; events already
    /// delivered to the sink remain valid.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Stop after `frames` frames and return a summary as if the source had
    /// ended.
    #[must_use]
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Stop at the first frame whose timestamp is later than `end`. That
    /// frame is not processed and the session ends with a summary.
    #[must_use]
    pub fn with_end_time(mut self, end: Duration) -> Self {
        self.end_time = Some(end);
        self
    }

    /// Tell the progress reporter how many frames to expect.
    #[must_use]
    pub fn with_expected_frames(mut self, frames: u64) -> Self {
        self.expected_frames = Some(frames);
        self
    }

    /// Set the state assumed for the frame before the first one.
    ///
    /// With [`FadeState::Dark`] a stream that opens on black does not
    /// report a transition at frame 0.
    #[must_use]
    pub fn with_initial_state(mut self, state: FadeState) -> Self {
        self.initial_state = state;
        self
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
