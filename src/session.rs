//! The detection loop.
//!
//! A [`DetectionSession`] owns one tracker and one set of counters. It pulls
//! frames from a [`FrameSource`], classifies each one, advances the tracker
//! and hands any resulting [`FadeEvent`] to an [`EventSink`]. Sessions are
//! single-use: `run` consumes the session, so no state leaks from one
//! stream into the next.
//!
//! # Example
//!
//! ```
//! use fadescan::{DetectionConfig, DetectionSession, FadeEvent, FadeKind, FrameSample, MemorySource};
//!
//! let lit = FrameSample::filled(48, 64, 3, 180);
//! let black = FrameSample::filled(48, 64, 3, 0);
//! let frames = vec![lit.clone(), black.clone(), black, lit];
//! let mut source = MemorySource::from_frames(frames, 25.0)?;
//!
//! let mut events: Vec<FadeEvent> = Vec::new();
//! let session = DetectionSession::new(DetectionConfig::new())?;
//! let summary = session.run(&mut source, &mut events)?;
//!
//! assert_eq!(summary.frames_processed, 4);
//! assert_eq!(events[0].kind, FadeKind::FadeIn);
//! assert_eq!(events[1].frame_index, 3);
//! # Ok::<(), fadescan::FadeError>(())
//! ```

use crate::config::{DetectionConfig, SessionOptions};
use crate::error::FadeError;
use crate::event::{EventSink, FadeEvent};
use crate::progress::ProgressTracker;
use crate::scanner;
use crate::source::{FrameSource, SourceFrame};
use crate::stats::{SessionStats, SessionSummary};
use crate::tracker::{FadeState, FadeStateTracker};

/// Fade detection over one stream.
#[derive(Debug)]
pub struct DetectionSession {
    config: DetectionConfig,
    options: SessionOptions,
    tracker: FadeStateTracker,
    stats: SessionStats,
}

impl DetectionSession {
    /// Create a session with default [`SessionOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`FadeError::InvalidConfig`] if `config` does not validate.
    pub fn new(config: DetectionConfig) -> Result<Self, FadeError> {
        Self::with_options(config, SessionOptions::new())
    }

    /// Create a session with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`FadeError::InvalidConfig`] if `config` does not validate.
    pub fn with_options(config: DetectionConfig, options: SessionOptions) -> Result<Self, FadeError> {
        config.validate()?;

        Ok(Self {
            config,
            tracker: FadeStateTracker::with_initial_state(options.initial_state),
            options,
            stats: SessionStats::new(),
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Tracker state after the last processed frame.
    pub fn state(&self) -> FadeState {
        self.tracker.state()
    }

    /// Classify one frame and advance the tracker.
    ///
    /// Frames must be passed in capture order. The first frame that
    /// classifies starts the session clock.
    ///
    /// # Errors
    ///
    /// Returns [`FadeError::InvalidFrame`] if the frame cannot be
    /// classified; the tracker and counters are left untouched.
    pub fn process_frame(&mut self, frame: &SourceFrame) -> Result<Option<FadeEvent>, FadeError> {
        let classification = scanner::classify(&frame.sample, &self.config)?;
        self.stats.start();
        let event = self
            .tracker
            .advance(classification, frame.timestamp, frame.frame_index);
        self.stats
            .record_frame(classification.is_dark(), event.is_some());

        log::trace!(
            "Frame {} at {:?}: {:?}",
            frame.frame_index,
            frame.timestamp,
            classification
        );
        if let Some(event) = &event {
            log::info!("Detected {event}");
        }

        Ok(event)
    }

    /// Pull frames from `source` until it is exhausted, forwarding events
    /// to `sink`.
    ///
    /// # Errors
    ///
    /// Source errors and [`FadeError::InvalidFrame`] abort the loop and are
    /// returned unchanged; [`FadeError::Cancelled`] is returned if the
    /// cancellation token fires. Events already delivered to `sink` are not
    /// withdrawn in either case.
    pub fn run<S, K>(mut self, source: &mut S, sink: &mut K) -> Result<SessionSummary, FadeError>
    where
        S: FrameSource + ?Sized,
        K: EventSink + ?Sized,
    {
        log::debug!(
            "Starting fade detection (threshold={}, min_dark_percent={}, block_rows={}, strategy={:?})",
            self.config.intensity_threshold,
            self.config.min_dark_percent,
            self.config.block_rows,
            self.config.strategy,
        );

        let expected = self
            .options
            .expected_frames
            .or_else(|| source.frame_count_hint());
        let total = match (expected, self.options.max_frames) {
            (Some(expected), Some(max)) => Some(expected.min(max)),
            (expected, max) => expected.or(max),
        };
        let mut progress = ProgressTracker::new(
            self.options.progress.clone(),
            total,
            self.options.batch_size,
        );

        self.stats.start();

        loop {
            if self.options.is_cancelled() {
                log::debug!(
                    "Fade detection cancelled after {} frames",
                    self.stats.frames_processed()
                );
                return Err(FadeError::Cancelled);
            }

            if self
                .options
                .max_frames
                .is_some_and(|max| self.stats.frames_processed() >= max)
            {
                log::debug!("Reached frame limit of {}", self.stats.frames_processed());
                break;
            }

            let Some(frame) = source.next_frame()? else {
                break;
            };
            if self
                .options
                .end_time
                .is_some_and(|end| frame.timestamp > end)
            {
                log::debug!("Reached end time at frame {}", frame.frame_index);
                break;
            }

            let event = self.process_frame(&frame)?;
            progress.advance(frame.frame_index, frame.timestamp, event.is_some());
            if let Some(event) = event {
                sink.emit(event);
            }
        }

        progress.finish();
        let summary = self.stats.finish();

        log::debug!(
            "Processed {} frames in {:.2}s ({} transitions)",
            summary.frames_processed,
            summary.elapsed.as_secs_f64(),
            summary.events_emitted,
        );

        Ok(summary)
    }

    /// Stop the clock and summarize a session driven by
    /// [`process_frame`](DetectionSession::process_frame).
    pub fn finish(mut self) -> SessionSummary {
        self.stats.finish()
    }
}

/// Run a default-option session and collect its events.
///
/// # Errors
///
/// Same as [`DetectionSession::run`], plus configuration errors.
pub fn detect_fades<S>(
    source: &mut S,
    config: DetectionConfig,
) -> Result<(Vec<FadeEvent>, SessionSummary), FadeError>
where
    S: FrameSource + ?Sized,
{
    let mut events: Vec<FadeEvent> = Vec::new();
    let summary = DetectionSession::new(config)?.run(source, &mut events)?;
    Ok((events, summary))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::event::FadeKind;
    use crate::frame::FrameSample;
    use crate::source::MemorySource;

    fn frame(value: u8) -> FrameSample {
        FrameSample::filled(8, 8, 3, value)
    }

    #[test]
    fn process_frame_reports_transitions() {
        let mut session = DetectionSession::new(DetectionConfig::new()).unwrap();
        let lit = SourceFrame::new(frame(200), Duration::ZERO, 0);
        let dark = SourceFrame::new(frame(0), Duration::from_millis(40), 1);

        assert!(session.process_frame(&lit).unwrap().is_none());
        let event = session.process_frame(&dark).unwrap().unwrap();
        assert_eq!(event.kind, FadeKind::FadeIn);
        assert_eq!(event.frame_index, 1);
        assert_eq!(session.state(), FadeState::Dark);

        let summary = session.finish();
        assert_eq!(summary.frames_processed, 2);
        assert_eq!(summary.dark_frames, 1);
    }

    #[test]
    fn invalid_frame_leaves_counters_untouched() {
        let mut session = DetectionSession::new(DetectionConfig::new()).unwrap();
        let empty = SourceFrame::new(FrameSample::filled(0, 8, 3, 0), Duration::ZERO, 0);
        assert!(matches!(
            session.process_frame(&empty),
            Err(FadeError::InvalidFrame(_))
        ));
        assert_eq!(session.stats().frames_processed(), 0);
        assert_eq!(session.state(), FadeState::Lit);

        std::thread::sleep(Duration::from_millis(2));
        let summary = session.finish();
        assert_eq!(summary.elapsed, Duration::ZERO);
    }

    #[test]
    fn max_frames_stops_normally() {
        let frames = vec![frame(0); 10];
        let mut source = MemorySource::from_frames(frames, 30.0).unwrap();
        let options = SessionOptions::new().with_max_frames(4);
        let session = DetectionSession::with_options(DetectionConfig::new(), options).unwrap();
        let mut events: Vec<FadeEvent> = Vec::new();
        let summary = session.run(&mut source, &mut events).unwrap();
        assert_eq!(summary.frames_processed, 4);
        assert_eq!(source.remaining(), 6);
    }

    #[test]
    fn end_time_stops_before_later_frames() {
        let values = [200, 200, 200, 0, 0, 0, 0, 200, 200, 200];
        let frames = values.iter().map(|&value| frame(value)).collect();
        let mut source = MemorySource::from_frames(frames, 10.0).unwrap();
        let options = SessionOptions::new().with_end_time(Duration::from_millis(400));
        let session = DetectionSession::with_options(DetectionConfig::new(), options).unwrap();
        let mut events: Vec<FadeEvent> = Vec::new();
        let summary = session.run(&mut source, &mut events).unwrap();

        assert_eq!(summary.frames_processed, 5);
        assert_eq!(source.remaining(), 4);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, FadeKind::FadeIn);
    }

    #[test]
    fn detect_fades_collects_events() {
        let frames = vec![frame(0), frame(0), frame(90)];
        let mut source = MemorySource::from_frames(frames, 30.0).unwrap();
        let (events, summary) = detect_fades(&mut source, DetectionConfig::new()).unwrap();
        assert_eq!(summary.frames_processed, 3);
        assert_eq!(
            events.iter().map(|event| event.kind).collect::<Vec<_>>(),
            vec![FadeKind::FadeIn, FadeKind::FadeOut]
        );
    }

    #[test]
    fn construction_validates_config() {
        let config = DetectionConfig::new().with_min_dark_percent(101.0);
        assert!(matches!(
            DetectionSession::new(config),
            Err(FadeError::InvalidConfig { .. })
        ));
    }
}
