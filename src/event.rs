//! Fade transition events and the sinks that receive them.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

/// Direction of a detected transition.
///
/// By convention a fade *in* enters the dark state (lit → dark) and a fade
/// *out* leaves it (dark → lit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FadeKind {
    /// The stream went from lit to dark.
    FadeIn,
    /// The stream went from dark to lit.
    FadeOut,
}

impl FadeKind {
    /// Lowercase label used in text and JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            FadeKind::FadeIn => "fade-in",
            FadeKind::FadeOut => "fade-out",
        }
    }
}

impl Display for FadeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A single detected transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeEvent {
    /// Which way the transition went.
    pub kind: FadeKind,
    /// Timestamp of the first frame in the new state, relative to the start
    /// of the stream.
    pub timestamp: Duration,
    /// Index of the first frame in the new state.
    pub frame_index: u64,
}

impl FadeEvent {
    /// Timestamp in whole milliseconds.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp.as_millis() as u64
    }
}

impl Display for FadeEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} at {}ms (frame {})",
            self.kind,
            self.timestamp_ms(),
            self.frame_index
        )
    }
}

/// Receives fade events in the order they are detected.
///
/// Implemented for `Vec<FadeEvent>` (collects) and for any
/// `FnMut(FadeEvent)` closure.
pub trait EventSink {
    /// Accept one event. Ownership passes to the sink.
    fn emit(&mut self, event: FadeEvent);
}

impl EventSink for Vec<FadeEvent> {
    fn emit(&mut self, event: FadeEvent) {
        self.push(event);
    }
}

impl<F: FnMut(FadeEvent)> EventSink for F {
    fn emit(&mut self, event: FadeEvent) {
        self(event)
    }
}
