//! Async fade detection.
//!
//! [`FadeEventStream`] runs a [`DetectionSession`] on a blocking thread via
//! `tokio::task::spawn_blocking` and delivers its events through a bounded
//! channel, so CPU-heavy decoding never stalls the runtime's worker threads.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use fadescan::{DetectionConfig, FadeError, FadeEventStream, SessionOptions};
//!
//! # async fn example() -> Result<(), FadeError> {
//! let mut stream =
//!     FadeEventStream::from_video_file("input.mp4", DetectionConfig::new(), SessionOptions::new())?;
//!
//! while let Some(event) = stream.next().await {
//!     println!("{event}");
//! }
//! let summary = stream.finish().await?;
//! println!("{} frames", summary.frames_processed);
//! # Ok(())
//! # }
//! ```

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_stream::Stream;

use crate::config::{DetectionConfig, SessionOptions};
use crate::error::FadeError;
use crate::event::FadeEvent;
use crate::session::DetectionSession;
use crate::source::{FrameSource, SourceFrame};
use crate::stats::SessionSummary;

/// Events buffered between the session thread and the consumer.
const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Fade events produced by a session running on a blocking thread.
///
/// Implements [`tokio_stream::Stream`]. The stream ends when the session
/// ends, whether it succeeded or not; call
/// [`finish`](FadeEventStream::finish) to learn which. Dropping the stream
/// cancels the session before its next frame.
pub struct FadeEventStream {
    receiver: Receiver<FadeEvent>,
    handle: JoinHandle<Result<SessionSummary, FadeError>>,
}

impl FadeEventStream {
    /// Run a session over `source` in the background.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`FadeError::InvalidConfig`] immediately if `config` does
    /// not validate.
    pub fn spawn<S>(source: S, config: DetectionConfig, options: SessionOptions) -> Result<Self, FadeError>
    where
        S: FrameSource + Send + 'static,
    {
        let session = DetectionSession::with_options(config, options)?;
        Ok(Self::spawn_with(DEFAULT_CHANNEL_CAPACITY, move |sender| {
            run_session(session, source, sender)
        }))
    }

    /// Open `path` with a [`VideoFileSource`](crate::VideoFileSource) on
    /// the blocking thread and run a session over it.
    ///
    /// Open failures are reported by [`finish`](FadeEventStream::finish).
    ///
    /// # Errors
    ///
    /// Returns [`FadeError::InvalidConfig`] immediately if `config` does
    /// not validate.
    #[cfg(feature = "ffmpeg")]
    pub fn from_video_file<P>(path: P, config: DetectionConfig, options: SessionOptions) -> Result<Self, FadeError>
    where
        P: AsRef<std::path::Path>,
    {
        let path = path.as_ref().to_path_buf();
        let session = DetectionSession::with_options(config, options)?;
        Ok(Self::spawn_with(DEFAULT_CHANNEL_CAPACITY, move |sender| {
            let source = crate::video::VideoFileSource::open(&path)?;
            run_session(session, source, sender)
        }))
    }

    fn spawn_with<F>(capacity: usize, work: F) -> Self
    where
        F: FnOnce(Sender<FadeEvent>) -> Result<SessionSummary, FadeError> + Send + 'static,
    {
        let (sender, receiver) = tokio::sync::mpsc::channel(capacity.max(1));
        let handle = tokio::task::spawn_blocking(move || work(sender));
        Self { receiver, handle }
    }

    /// Wait for the session to run to completion and return its summary.
    ///
    /// Events not yet received are discarded, but the session still
    /// processes every remaining frame.
    ///
    /// # Errors
    ///
    /// Returns whatever the session returned. A session thread that
    /// panicked or was aborted is reported as [`FadeError::Cancelled`].
    pub async fn finish(self) -> Result<SessionSummary, FadeError> {
        let Self {
            mut receiver,
            handle,
        } = self;
        // The sender is dropped when the session returns.
        while receiver.recv().await.is_some() {}
        handle.await.unwrap_or_else(|_| Err(FadeError::Cancelled))
    }
}

impl Stream for FadeEventStream {
    type Item = FadeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

fn run_session<S: FrameSource>(
    session: DetectionSession,
    source: S,
    sender: Sender<FadeEvent>,
) -> Result<SessionSummary, FadeError> {
    let mut source = UntilClosed {
        inner: source,
        sender: &sender,
    };
    let mut sink = |event: FadeEvent| {
        // A closed channel is picked up by `UntilClosed` on the next frame.
        let _ = sender.blocking_send(event);
    };
    session.run(&mut source, &mut sink)
}

/// Cancels the session once the consumer has gone away.
struct UntilClosed<'a, S> {
    inner: S,
    sender: &'a Sender<FadeEvent>,
}

impl<S: FrameSource> FrameSource for UntilClosed<'_, S> {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FadeError> {
        if self.sender.is_closed() {
            log::debug!("Event receiver dropped; cancelling session");
            return Err(FadeError::Cancelled);
        }
        self.inner.next_frame()
    }

    fn frame_count_hint(&self) -> Option<u64> {
        self.inner.frame_count_hint()
    }
}

#[cfg(test)]
mod tests {
    use tokio_stream::StreamExt;

    use super::*;
    use crate::event::FadeKind;
    use crate::frame::FrameSample;
    use crate::source::MemorySource;

    fn source(values: &[u8]) -> MemorySource {
        let frames = values
            .iter()
            .map(|&value| FrameSample::filled(8, 8, 1, value))
            .collect();
        MemorySource::from_frames(frames, 25.0).unwrap()
    }

    #[tokio::test]
    async fn streams_events_then_summary() {
        let mut stream = FadeEventStream::spawn(
            source(&[200, 0, 0, 200]),
            DetectionConfig::new(),
            SessionOptions::new(),
        )
        .unwrap();

        let mut kinds = Vec::new();
        while let Some(event) = stream.next().await {
            kinds.push(event.kind);
        }
        assert_eq!(kinds, vec![FadeKind::FadeIn, FadeKind::FadeOut]);

        let summary = stream.finish().await.unwrap();
        assert_eq!(summary.frames_processed, 4);
    }

    #[tokio::test]
    async fn finish_without_draining_runs_every_frame() {
        // Alternating frames produce far more events than the channel holds.
        let values: Vec<u8> = (0..2_000)
            .map(|index| if index % 2 == 0 { 0 } else { 200 })
            .collect();
        let stream =
            FadeEventStream::spawn(source(&values), DetectionConfig::new(), SessionOptions::new())
                .unwrap();

        let summary = stream.finish().await.unwrap();
        assert_eq!(summary.frames_processed, 2_000);
        assert_eq!(summary.events_emitted, 2_000);
    }

    #[tokio::test]
    async fn finish_after_partial_read_still_completes() {
        let values = vec![0u8; 5_000];
        let mut stream =
            FadeEventStream::spawn(source(&values), DetectionConfig::new(), SessionOptions::new())
                .unwrap();

        let first = stream.next().await.unwrap();
        assert_eq!(first.kind, FadeKind::FadeIn);

        let summary = stream.finish().await.unwrap();
        assert_eq!(summary.frames_processed, 5_000);
        assert_eq!(summary.dark_frames, 5_000);
    }

    #[test]
    fn closed_receiver_cancels_the_session() {
        let (sender, receiver) = tokio::sync::mpsc::channel(1);
        drop(receiver);

        let mut source = UntilClosed {
            inner: source(&[0, 0]),
            sender: &sender,
        };
        assert!(matches!(source.next_frame(), Err(FadeError::Cancelled)));

        let session = DetectionSession::new(DetectionConfig::new()).unwrap();
        assert!(matches!(
            run_session(session, source.inner, sender),
            Err(FadeError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn invalid_config_fails_before_spawning() {
        let result = FadeEventStream::spawn(
            source(&[0]),
            DetectionConfig::new().with_intensity_threshold(300),
            SessionOptions::new(),
        );
        assert!(matches!(result, Err(FadeError::InvalidConfig { .. })));
    }

    #[cfg(feature = "ffmpeg")]
    #[tokio::test]
    async fn missing_file_is_reported_by_finish() {
        let stream = FadeEventStream::from_video_file(
            "does/not/exist.mp4",
            DetectionConfig::new(),
            SessionOptions::new(),
        )
        .unwrap();
        assert!(matches!(
            stream.finish().await,
            Err(FadeError::FileOpen { .. })
        ));
    }
}
