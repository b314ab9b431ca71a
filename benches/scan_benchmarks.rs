//! Benchmarks for frame classification and whole-file detection.
//!
//! Run with: cargo bench
//!
//! The file benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fadescan::scanner::{count_lit_samples, mean_intensity, scan};
use fadescan::{DetectionConfig, FrameSample};

const ROWS: usize = 1080;
const COLS: usize = 1920;

fn benchmark_lit_frame(criterion: &mut Criterion) {
    let frame = FrameSample::filled(ROWS, COLS, 3, 180);
    let config = DetectionConfig::new();

    let mut group = criterion.benchmark_group("lit 1080p frame");
    group.bench_function("block scan (early exit)", |bencher| {
        bencher.iter(|| scan(black_box(&frame), &config).unwrap());
    });
    group.bench_function("full count", |bencher| {
        bencher.iter(|| count_lit_samples(black_box(&frame), 16));
    });
    group.bench_function("mean intensity", |bencher| {
        bencher.iter(|| mean_intensity(black_box(&frame)).unwrap());
    });
    group.finish();
}

fn benchmark_dark_frame(criterion: &mut Criterion) {
    // Dark frames can never exit early, so every block size reads all rows.
    let frame = FrameSample::filled(ROWS, COLS, 3, 4);

    let mut group = criterion.benchmark_group("dark 1080p frame");
    for block_rows in [1, 8, 32, 128, ROWS] {
        let config = DetectionConfig::new().with_block_rows(block_rows);
        group.bench_with_input(BenchmarkId::new("block rows", block_rows), &config, |bencher, config| {
            bencher.iter(|| scan(black_box(&frame), config).unwrap());
        });
    }
    group.finish();
}

#[cfg(feature = "ffmpeg")]
fn benchmark_video_file(criterion: &mut Criterion) {
    use std::path::Path;

    use fadescan::{FfmpegLogLevel, PixelFormat, VideoFileSource, detect_fades};

    const FADE_VIDEO: &str = "tests/fixtures/fade_video.mp4";

    fadescan::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(FADE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let mut group = criterion.benchmark_group("fade video");
    group.sample_size(10);
    for (name, pixel_format) in [("rgb8", PixelFormat::Rgb8), ("gray8", PixelFormat::Gray8)] {
        group.bench_function(name, |bencher| {
            bencher.iter(|| {
                let mut source = VideoFileSource::open_with_format(FADE_VIDEO, pixel_format).unwrap();
                detect_fades(&mut source, DetectionConfig::new()).unwrap()
            });
        });
    }
    group.finish();
}

#[cfg(not(feature = "ffmpeg"))]
fn benchmark_video_file(_criterion: &mut Criterion) {}

criterion::criterion_group!(
    benches,
    benchmark_lit_frame,
    benchmark_dark_frame,
    benchmark_video_file,
);
criterion::criterion_main!(benches);
