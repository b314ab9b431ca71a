//! Throughput accounting for a detection session.

use std::time::{Duration, Instant};

use crate::error::FadeError;

/// Running counters owned by one session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    frames_processed: u64,
    dark_frames: u64,
    events_emitted: u64,
    started: Option<Instant>,
    elapsed: Duration,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStats {
    /// Empty counters; the clock has not started.
    pub fn new() -> Self {
        Self {
            frames_processed: 0,
            dark_frames: 0,
            events_emitted: 0,
            started: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Start the wall clock. Later calls keep the first start time.
    pub fn start(&mut self) {
        self.started.get_or_insert_with(Instant::now);
    }

    /// Record one classified frame.
    pub fn record_frame(&mut self, dark: bool, emitted_event: bool) {
        self.frames_processed += 1;
        if dark {
            self.dark_frames += 1;
        }
        if emitted_event {
            self.events_emitted += 1;
        }
    }

    /// Stop the clock and produce the summary.
    pub fn finish(&mut self) -> SessionSummary {
        if let Some(started) = self.started {
            self.elapsed = started.elapsed();
        }
        self.summary()
    }

    /// Summary of the counters as they stand.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary::new(self.frames_processed, self.elapsed)
            .with_counts(self.dark_frames, self.events_emitted)
    }

    /// Frames recorded so far.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Transitions recorded so far.
    pub fn events_emitted(&self) -> u64 {
        self.events_emitted
    }
}

/// Final report of a completed session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    /// Frames classified.
    pub frames_processed: u64,
    /// Wall-clock time from the first frame request to end-of-stream.
    pub elapsed: Duration,
    /// `frames_processed / elapsed`, or `None` when either is zero.
    pub average_fps: Option<f64>,
    /// Frames classified as dark.
    pub dark_frames: u64,
    /// Transitions delivered to the sink.
    pub events_emitted: u64,
}

impl SessionSummary {
    /// Build a summary, deriving the average rate.
    pub fn new(frames_processed: u64, elapsed: Duration) -> Self {
        let seconds = elapsed.as_secs_f64();
        let average_fps =
            (frames_processed > 0 && seconds > 0.0).then(|| frames_processed as f64 / seconds);

        Self {
            frames_processed,
            elapsed,
            average_fps,
            dark_frames: 0,
            events_emitted: 0,
        }
    }

    fn with_counts(mut self, dark_frames: u64, events_emitted: u64) -> Self {
        self.dark_frames = dark_frames;
        self.events_emitted = events_emitted;
        self
    }

    /// The average processing rate.
    ///
    /// # Errors
    ///
    /// Returns [`FadeError::RateUndefined`] if no frames were processed or
    /// no time elapsed.
    pub fn frame_rate(&self) -> Result<f64, FadeError> {
        self.average_fps.ok_or(FadeError::RateUndefined)
    }
}
