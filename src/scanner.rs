//! Block-sampled dark frame classification.
//!
//! A frame is dark when at least `min_dark_percent` of its samples are at
//! or below `intensity_threshold`. Equivalently, it is lit as soon as the
//! number of samples strictly above the threshold exceeds
//! `total_samples * (100 - min_dark_percent) / 100`.
//!
//! [`scan`] walks the frame in blocks of `block_rows` rows and checks that
//! bound after every block. Once it is exceeded no later block can bring
//! the count back down, so the scan stops there. The result is always the
//! same as counting every sample with [`count_lit_samples`]; only the
//! amount of work differs.
//!
//! # Example
//!
//! ```
//! use fadescan::{DetectionConfig, FrameClassification, FrameSample, scanner};
//!
//! let frame = FrameSample::filled(720, 1280, 3, 4);
//! let config = DetectionConfig::new();
//! assert_eq!(scanner::classify(&frame, &config)?, FrameClassification::Dark);
//! # Ok::<(), fadescan::FadeError>(())
//! ```

use crate::config::{DetectionConfig, DetectionStrategy};
use crate::error::FadeError;
use crate::frame::FrameSample;

/// Per-frame dark/lit decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameClassification {
    /// Enough samples are at or below the threshold.
    Dark,
    /// Too many samples are above the threshold.
    Lit,
}

impl FrameClassification {
    /// `true` for [`FrameClassification::Dark`].
    pub fn is_dark(self) -> bool {
        self == FrameClassification::Dark
    }
}

impl From<bool> for FrameClassification {
    fn from(dark: bool) -> Self {
        if dark {
            FrameClassification::Dark
        } else {
            FrameClassification::Lit
        }
    }
}

/// What a block-sampled scan observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanOutcome {
    /// The resulting classification.
    pub classification: FrameClassification,
    /// Samples above the threshold among the rows that were scanned.
    pub lit_count: u64,
    /// Rows examined before the decision was final.
    pub rows_scanned: usize,
    /// Lit samples the frame could hold and still be dark.
    pub max_lit_samples: f64,
}

impl ScanOutcome {
    /// `true` if the scan stopped before the last row.
    pub fn exited_early(&self, frame: &FrameSample) -> bool {
        self.rows_scanned < frame.rows()
    }
}

/// Classify a frame using the strategy selected in `config`.
///
/// # Errors
///
/// Returns [`FadeError::InvalidConfig`] for an out-of-range configuration
/// and [`FadeError::InvalidFrame`] for a frame with no samples.
pub fn classify(
    frame: &FrameSample,
    config: &DetectionConfig,
) -> Result<FrameClassification, FadeError> {
    match config.strategy {
        DetectionStrategy::BlockSampled => scan(frame, config).map(|outcome| outcome.classification),
        DetectionStrategy::MeanIntensity => {
            config.validate()?;
            let mean = mean_intensity(frame)?;
            Ok((mean < config.intensity_threshold as f64).into())
        }
    }
}

/// Run the block-sampled scan with early exit.
///
/// The strategy field of `config` is ignored.
///
/// # Errors
///
/// Same as [`classify`].
pub fn scan(frame: &FrameSample, config: &DetectionConfig) -> Result<ScanOutcome, FadeError> {
    config.validate()?;
    ensure_samples(frame)?;

    let threshold = sample_threshold(config);
    let max_lit_samples = config.max_lit_samples(frame.total_samples());
    let rows = frame.rows();

    let mut lit_count: u64 = 0;
    let mut rows_scanned = 0;

    while rows_scanned < rows {
        let block_end = rows_scanned.saturating_add(config.block_rows).min(rows);
        lit_count += count_above(frame.rows_slice(rows_scanned, block_end), threshold);
        rows_scanned = block_end;

        if lit_count as f64 > max_lit_samples {
            log::trace!(
                "Frame lit after {rows_scanned}/{rows} rows ({lit_count} > {max_lit_samples:.1})"
            );
            return Ok(ScanOutcome {
                classification: FrameClassification::Lit,
                lit_count,
                rows_scanned,
                max_lit_samples,
            });
        }
    }

    Ok(ScanOutcome {
        classification: FrameClassification::Dark,
        lit_count,
        rows_scanned,
        max_lit_samples,
    })
}

/// Count every sample strictly above `threshold`, without early exit.
pub fn count_lit_samples(frame: &FrameSample, threshold: u8) -> u64 {
    count_above(frame.as_bytes(), threshold)
}

/// Mean sample intensity over all rows, columns and channels.
///
/// # Errors
///
/// Returns [`FadeError::InvalidFrame`] for a frame with no samples.
pub fn mean_intensity(frame: &FrameSample) -> Result<f64, FadeError> {
    ensure_samples(frame)?;
    let sum: u64 = frame.as_bytes().iter().map(|&value| value as u64).sum();
    Ok(sum as f64 / frame.total_samples() as f64)
}

fn ensure_samples(frame: &FrameSample) -> Result<(), FadeError> {
    if frame.total_samples() == 0 {
        return Err(FadeError::InvalidFrame(format!(
            "frame has no samples ({}x{}x{})",
            frame.rows(),
            frame.cols(),
            frame.channels()
        )));
    }
    Ok(())
}

/// Validated thresholds always fit in a `u8`; anything larger would leave
/// no sample lit, which is also what `u8::MAX` gives.
fn sample_threshold(config: &DetectionConfig) -> u8 {
    u8::try_from(config.intensity_threshold).unwrap_or(u8::MAX)
}

fn count_above(samples: &[u8], threshold: u8) -> u64 {
    samples.iter().filter(|&&value| value > threshold).count() as u64
}
