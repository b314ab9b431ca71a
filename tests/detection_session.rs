//! Detection session integration tests.
//!
//! Sessions are driven from in-memory frames, so none of these tests need
//! FFmpeg or fixture files.

use std::time::Duration;

use fadescan::{
    DetectionConfig, DetectionSession, FadeError, FadeEvent, FadeKind, FadeState, FrameSample,
    FrameSource, MemorySource, SessionOptions, SourceFrame, detect_fades,
};

const LIT: u8 = 200;
const DARK: u8 = 0;

fn frames(values: &[u8]) -> Vec<FrameSample> {
    values
        .iter()
        .map(|&value| FrameSample::filled(24, 32, 3, value))
        .collect()
}

fn source(values: &[u8]) -> MemorySource {
    MemorySource::from_frames(frames(values), 25.0).expect("valid frame rate")
}

/// Fails with a read error after yielding `good` frames.
struct FailingSource {
    inner: MemorySource,
    good: usize,
    served: usize,
}

impl FrameSource for FailingSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FadeError> {
        if self.served == self.good {
            return Err(FadeError::SourceRead("disk went away".to_string()));
        }
        self.served += 1;
        self.inner.next_frame()
    }
}

#[test]
fn ten_frame_sequence_reports_four_transitions() {
    let sequence = [LIT, LIT, DARK, DARK, DARK, LIT, LIT, DARK, LIT, LIT];
    let mut source = source(&sequence);

    let (events, summary) = detect_fades(&mut source, DetectionConfig::new()).unwrap();

    let observed: Vec<(FadeKind, u64)> = events
        .iter()
        .map(|event| (event.kind, event.frame_index))
        .collect();
    assert_eq!(
        observed,
        vec![
            (FadeKind::FadeIn, 2),
            (FadeKind::FadeOut, 5),
            (FadeKind::FadeIn, 7),
            (FadeKind::FadeOut, 8),
        ]
    );
    assert_eq!(events[1].timestamp, Duration::from_millis(200));
    assert_eq!(summary.frames_processed, 10);
    assert_eq!(summary.dark_frames, 4);
    assert_eq!(summary.events_emitted, 4);
}

#[test]
fn events_arrive_in_chronological_order() {
    let mut source = source(&[DARK, LIT, DARK, LIT, DARK, LIT]);
    let (events, _) = detect_fades(&mut source, DetectionConfig::new()).unwrap();

    assert!(
        events
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp)
    );
    assert!(
        events
            .windows(2)
            .all(|pair| pair[0].kind != pair[1].kind)
    );
}

#[test]
fn all_dark_stream_with_default_initial_state() {
    let mut source = source(&[DARK; 12]);
    let (events, summary) = detect_fades(&mut source, DetectionConfig::new()).unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, FadeKind::FadeIn);
    assert_eq!(events[0].frame_index, 0);
    assert_eq!(summary.dark_frames, 12);
}

#[test]
fn all_dark_stream_starting_dark_reports_nothing() {
    let mut source = source(&[DARK; 12]);
    let options = SessionOptions::new().with_initial_state(FadeState::Dark);
    let session = DetectionSession::with_options(DetectionConfig::new(), options).unwrap();

    let mut events: Vec<FadeEvent> = Vec::new();
    let summary = session.run(&mut source, &mut events).unwrap();

    assert!(events.is_empty());
    assert_eq!(summary.frames_processed, 12);
    assert_eq!(summary.dark_frames, 12);
}

#[test]
fn empty_source_has_no_rate() {
    let mut source = source(&[]);
    let (events, summary) = detect_fades(&mut source, DetectionConfig::new()).unwrap();

    assert!(events.is_empty());
    assert_eq!(summary.frames_processed, 0);
    assert_eq!(summary.average_fps, None);
    assert!(matches!(summary.frame_rate(), Err(FadeError::RateUndefined)));
}

#[test]
fn source_errors_abort_and_keep_earlier_events() {
    let mut source = FailingSource {
        inner: source(&[LIT, DARK, DARK, LIT, LIT]),
        good: 3,
        served: 0,
    };

    let mut events: Vec<FadeEvent> = Vec::new();
    let session = DetectionSession::new(DetectionConfig::new()).unwrap();
    let result = session.run(&mut source, &mut events);

    match result {
        Err(FadeError::SourceRead(message)) => assert_eq!(message, "disk went away"),
        other => panic!("expected a source read error, got {other:?}"),
    }
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, FadeKind::FadeIn);
}

#[test]
fn malformed_frame_aborts_session() {
    let timed = vec![
        SourceFrame::new(FrameSample::filled(4, 4, 1, LIT), Duration::ZERO, 0),
        SourceFrame::new(FrameSample::filled(4, 0, 1, LIT), Duration::from_millis(40), 1),
    ];
    let mut source = MemorySource::from_timed(timed);

    let result = detect_fades(&mut source, DetectionConfig::new());
    assert!(matches!(result, Err(FadeError::InvalidFrame(_))));
}

#[test]
fn closures_work_as_sinks() {
    let mut source = source(&[LIT, DARK, LIT]);
    let mut kinds = Vec::new();
    let mut sink = |event: FadeEvent| kinds.push(event.kind);

    DetectionSession::new(DetectionConfig::new())
        .unwrap()
        .run(&mut source, &mut sink)
        .unwrap();

    assert_eq!(kinds, vec![FadeKind::FadeIn, FadeKind::FadeOut]);
}

#[test]
fn sessions_do_not_share_state() {
    let config = DetectionConfig::new();

    let mut first = source(&[LIT, DARK]);
    let (first_events, _) = detect_fades(&mut first, config).unwrap();

    // A fresh session starts Lit again, so the opening dark frame is a
    // transition even though the previous stream ended dark.
    let mut second = source(&[DARK]);
    let (second_events, _) = detect_fades(&mut second, config).unwrap();

    assert_eq!(first_events.len(), 1);
    assert_eq!(second_events.len(), 1);
    assert_eq!(second_events[0].frame_index, 0);
}

#[test]
fn timed_frames_keep_their_timestamps() {
    let timed = vec![
        SourceFrame::new(FrameSample::filled(4, 4, 1, LIT), Duration::from_millis(1000), 30),
        SourceFrame::new(FrameSample::filled(4, 4, 1, DARK), Duration::from_millis(2502), 60),
    ];
    let mut source = MemorySource::from_timed(timed);
    let (events, _) = detect_fades(&mut source, DetectionConfig::new()).unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].timestamp_ms(), 2502);
    assert_eq!(events[0].frame_index, 60);
    assert_eq!(events[0].to_string(), "fade-in at 2502ms (frame 60)");
}

#[test]
fn mean_strategy_detects_the_same_clean_fades() {
    use fadescan::DetectionStrategy;

    let sequence = [LIT, DARK, DARK, LIT];
    let block = detect_fades(&mut source(&sequence), DetectionConfig::new())
        .unwrap()
        .0;
    let mean = detect_fades(
        &mut source(&sequence),
        DetectionConfig::new().with_strategy(DetectionStrategy::MeanIntensity),
    )
    .unwrap()
    .0;

    assert_eq!(block, mean);
}
