//! Image sequence source integration tests.
//!
//! Frames are written as PNG files into a temporary directory.

use std::path::Path;
use std::time::Duration;

use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

use fadescan::{
    DetectionConfig, FadeError, FadeKind, FrameSource, ImageSequenceSource, detect_fades,
};

fn write_rgb(directory: &Path, name: &str, value: u8) {
    RgbImage::from_pixel(32, 24, Rgb([value, value, value]))
        .save(directory.join(name))
        .expect("Failed to write test frame");
}

#[test]
fn frames_are_read_in_name_order() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let directory = temporary_directory.path();

    // Written out of order on purpose.
    write_rgb(directory, "frame_0003.png", 200);
    write_rgb(directory, "frame_0001.png", 0);
    write_rgb(directory, "frame_0000.png", 200);
    write_rgb(directory, "frame_0002.png", 0);
    std::fs::write(directory.join("notes.txt"), "not a frame").unwrap();

    let mut source = ImageSequenceSource::open(directory, 10.0).unwrap();
    assert_eq!(source.len(), 4);
    assert_eq!(source.frame_count_hint(), Some(4));

    let (events, summary) = detect_fades(&mut source, DetectionConfig::new()).unwrap();
    assert_eq!(summary.frames_processed, 4);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, FadeKind::FadeIn);
    assert_eq!(events[0].frame_index, 1);
    assert_eq!(events[0].timestamp, Duration::from_millis(100));
    assert_eq!(events[1].kind, FadeKind::FadeOut);
    assert_eq!(events[1].frame_index, 3);
}

#[test]
fn opaque_black_rgba_frames_are_dark() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let directory = temporary_directory.path();

    RgbaImage::from_pixel(8, 8, Rgba([200, 200, 200, 255]))
        .save(directory.join("frame_0000.png"))
        .unwrap();
    RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]))
        .save(directory.join("frame_0001.png"))
        .unwrap();

    let mut source = ImageSequenceSource::open(directory, 25.0).unwrap();
    let (events, summary) = detect_fades(&mut source, DetectionConfig::new()).unwrap();

    assert_eq!(summary.dark_frames, 1);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, FadeKind::FadeIn);
    assert_eq!(events[0].frame_index, 1);
}

#[test]
fn grayscale_images_keep_one_channel() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temporary_directory.path().join("gray.png");
    GrayImage::from_pixel(16, 8, Luma([5])).save(&path).unwrap();

    let mut source = ImageSequenceSource::from_paths(vec![path], 25.0).unwrap();
    let frame = source.next_frame().unwrap().unwrap();
    assert_eq!(frame.sample.channels(), 1);
    assert_eq!(frame.sample.rows(), 8);
    assert_eq!(frame.sample.cols(), 16);
    assert!(source.next_frame().unwrap().is_none());
}

#[test]
fn empty_directory_yields_no_frames() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let mut source = ImageSequenceSource::open(temporary_directory.path(), 25.0).unwrap();
    assert!(source.is_empty());
    assert!(source.next_frame().unwrap().is_none());
}

#[test]
fn unreadable_image_is_a_source_error() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let directory = temporary_directory.path();
    write_rgb(directory, "a.png", 0);
    std::fs::write(directory.join("b.png"), b"this is not a png").unwrap();

    let mut source = ImageSequenceSource::open(directory, 25.0).unwrap();
    let result = detect_fades(&mut source, DetectionConfig::new());

    match result {
        Err(FadeError::SourceRead(message)) => assert!(message.contains("b.png"), "{message}"),
        other => panic!("expected a source read error, got {other:?}"),
    }
}

#[test]
fn missing_directory_is_an_io_error() {
    let result = ImageSequenceSource::open("this/directory/does/not/exist", 25.0);
    assert!(matches!(result, Err(FadeError::IoError(_))));
}
