//! Edge-triggered fade state machine.
//!
//! | state | classification | next state | event   |
//! |-------|----------------|------------|---------|
//! | Lit   | Lit            | Lit        | none    |
//! | Lit   | Dark           | Dark       | FadeIn  |
//! | Dark  | Dark           | Dark       | none    |
//! | Dark  | Lit            | Lit        | FadeOut |
//!
//! Classifications must arrive in frame order; the tracker has no notion of
//! time beyond the previous frame.

use std::time::Duration;

use crate::event::{FadeEvent, FadeKind};
use crate::scanner::FrameClassification;

/// Classification of the most recent frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FadeState {
    /// Not dark. The state before the first frame unless configured
    /// otherwise.
    #[default]
    Lit,
    /// Dark.
    Dark,
}

impl From<FrameClassification> for FadeState {
    fn from(classification: FrameClassification) -> Self {
        match classification {
            FrameClassification::Dark => FadeState::Dark,
            FrameClassification::Lit => FadeState::Lit,
        }
    }
}

/// Turns per-frame classifications into fade events.
#[derive(Debug, Clone, Default)]
pub struct FadeStateTracker {
    state: FadeState,
}

impl FadeStateTracker {
    /// A tracker in the [`FadeState::Lit`] state.
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker that assumes `state` for the frame before the first one.
    pub fn with_initial_state(state: FadeState) -> Self {
        Self { state }
    }

    /// The state after the last advanced frame.
    pub fn state(&self) -> FadeState {
        self.state
    }

    /// Feed the next frame's classification.
    ///
    /// Returns an event exactly when the state changes.
    pub fn advance(
        &mut self,
        classification: FrameClassification,
        timestamp: Duration,
        frame_index: u64,
    ) -> Option<FadeEvent> {
        let next = FadeState::from(classification);
        let kind = match (self.state, next) {
            (FadeState::Lit, FadeState::Dark) => FadeKind::FadeIn,
            (FadeState::Dark, FadeState::Lit) => FadeKind::FadeOut,
            _ => return None,
        };

        self.state = next;
        Some(FadeEvent {
            kind,
            timestamp,
            frame_index,
        })
    }
}
