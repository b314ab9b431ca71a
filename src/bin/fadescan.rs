use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};

use fadescan::{
    DetectionConfig, DetectionSession, DetectionStrategy, FadeError, FadeEvent, FadeState,
    FrameSource, ImageSequenceSource, ProgressCallback, ProgressInfo, SessionOptions,
    SessionSummary, format_timecode, parse_timecode,
};
#[cfg(feature = "ffmpeg")]
use fadescan::{FfmpegLogLevel, PixelFormat, VideoFileSource};

const CLI_AFTER_HELP: &str = "Examples:\n  fadescan scan input.mp4\n  fadescan scan input.mp4 -t 8 -m 95 -b 32 -s 1 --timecodes\n  fadescan scan frames/ --fps 23.976 --json\n  fadescan info input.mp4 --json\n  fadescan completions zsh > _fadescan";

#[derive(Debug, Parser)]
#[command(
    name = "fadescan",
    version,
    about = "Detect fades to and from black in video files and image sequences",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output (RUST_LOG overrides).
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while scanning.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Decoded frame pixel format (rgb8, gray8).
    #[arg(long, global = true)]
    pixel_format: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan a video file or image directory for fades.
    #[command(
        about = "Detect fade transitions",
        visible_alias = "detect",
        after_help = "Examples:\n  fadescan scan input.mp4\n  fadescan scan input.mp4 --threshold 8 --min-percent 98 --timecodes"
    )]
    Scan(ScanArgs),

    /// Print stream properties for an input.
    #[command(
        about = "Print input metadata",
        visible_alias = "probe",
        after_help = "Examples:\n  fadescan info input.mp4\n  fadescan info input.mp4 --json"
    )]
    Info {
        /// Input video file or image directory.
        input: PathBuf,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Debug, Clone, clap::Args)]
struct ScanArgs {
    /// Input video file or directory of numbered images.
    input: PathBuf,

    /// 8-bit intensity value, from 0-255, at or below which a sample counts as dark.
    #[arg(short = 't', long, value_name = "INTENSITY", default_value_t = 16,
          value_parser = clap::value_parser!(u32).range(0..=255))]
    threshold: u32,

    /// Share of samples, from 0-100%, that must be at or below the threshold.
    #[arg(short = 'm', long, value_name = "PERCENT", default_value_t = 95.0)]
    min_percent: f64,

    /// Number of rows checked at once; tune for performance.
    #[arg(short = 'b', long, value_name = "ROWS", default_value_t = 32,
          value_parser = clap::value_parser!(u64).range(1..))]
    block_size: u64,

    /// Starting index for numbering the reported transitions.
    #[arg(short = 's', long, value_name = "OFFSET", default_value_t = 0, allow_negative_numbers = true)]
    start_index: i64,

    /// Classification strategy (block, mean).
    #[arg(long, default_value = "block")]
    strategy: String,

    /// Frame rate used to time image sequences.
    #[arg(long, default_value_t = 25.0)]
    fps: f64,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,

    /// Stop at this timestamp (seconds, MM:SS or HH:MM:SS[.mmm]).
    #[arg(long, value_name = "TIMECODE", value_parser = parse_timecode)]
    until: Option<Duration>,

    /// Treat the frame before the first one as dark, so a stream that
    /// opens on black reports nothing at frame 0.
    #[arg(long)]
    start_dark: bool,

    /// Output events and summary as machine-readable JSON.
    #[arg(long)]
    json: bool,

    /// Also print a comma-separated timecode list for mkvmerge/ffmpeg splitting.
    #[arg(long)]
    timecodes: bool,
}

fn parse_strategy(value: &str) -> Option<DetectionStrategy> {
    match value.to_ascii_lowercase().as_str() {
        "block" | "block-sampled" | "adaptive" => Some(DetectionStrategy::BlockSampled),
        "mean" | "mean-intensity" | "threshold" => Some(DetectionStrategy::MeanIntensity),
        _ => None,
    }
}

#[cfg(feature = "ffmpeg")]
fn parse_pixel_format(value: &str) -> Option<PixelFormat> {
    match value.to_ascii_lowercase().as_str() {
        "rgb8" | "rgb" => Some(PixelFormat::Rgb8),
        "gray8" | "gray" | "greyscale" | "grayscale" => Some(PixelFormat::Gray8),
        _ => None,
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(global.verbose);

    #[cfg(feature = "ffmpeg")]
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level
            .parse()
            .map_err(|_| format!("unsupported --log-level: {level}"))?;
        fadescan::set_ffmpeg_log_level(parsed);
    }

    #[cfg(not(feature = "ffmpeg"))]
    if global.log_level.is_some() || global.pixel_format.is_some() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            "--log-level and --pixel-format require building with the `ffmpeg` feature".yellow()
        );
    }

    Ok(())
}

/// Input opened for scanning, with what the summary header needs.
struct OpenedInput {
    source: Box<dyn FrameSource>,
    resolution: Option<(u32, u32)>,
    expected_frames: Option<u64>,
}

fn open_input(
    input: &Path,
    fps: f64,
    global: &GlobalOptions,
) -> Result<OpenedInput, Box<dyn std::error::Error>> {
    if input.is_dir() {
        let source = ImageSequenceSource::open(input, fps)?;
        if source.is_empty() {
            return Err(format!("no images found in {}", input.display()).into());
        }
        let expected_frames = Some(source.len() as u64);
        return Ok(OpenedInput {
            source: Box::new(source),
            resolution: None,
            expected_frames,
        });
    }

    open_video(input, global)
}

#[cfg(feature = "ffmpeg")]
fn open_video(input: &Path, global: &GlobalOptions) -> Result<OpenedInput, Box<dyn std::error::Error>> {
    let pixel_format = match &global.pixel_format {
        Some(value) => parse_pixel_format(value).ok_or(format!("unsupported --pixel-format: {value}"))?,
        None => PixelFormat::default(),
    };
    let source = VideoFileSource::open_with_format(input, pixel_format)?;
    let metadata = source.metadata();
    let resolution = Some((metadata.width, metadata.height));
    let expected_frames = (metadata.frame_count > 0).then_some(metadata.frame_count);
    Ok(OpenedInput {
        source: Box::new(source),
        resolution,
        expected_frames,
    })
}

#[cfg(not(feature = "ffmpeg"))]
fn open_video(input: &Path, _global: &GlobalOptions) -> Result<OpenedInput, Box<dyn std::error::Error>> {
    Err(format!(
        "{} is not a directory; decoding video files requires the `ffmpeg` feature",
        input.display()
    )
    .into())
}

struct BarProgress {
    bar: ProgressBar,
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.frames_processed);
        self.bar
            .set_message(format!("{} transitions", info.events_emitted));
    }
}

fn progress_bar(expected_frames: Option<u64>) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let bar = match expected_frames {
        Some(total) => ProgressBar::new(total),
        None => ProgressBar::no_length(),
    };
    let style =
        ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
    bar.set_style(style.progress_chars("##-"));
    Ok(bar)
}

fn event_line(ordinal: i64, event: &FadeEvent) -> String {
    format!(
        "[{ordinal}] Detected {} at {}ms (frame {}).",
        event.kind.as_str().replace('-', " "),
        event.timestamp_ms(),
        event.frame_index
    )
}

fn event_json(ordinal: i64, event: &FadeEvent) -> Value {
    json!({
        "index": ordinal,
        "kind": event.kind.as_str(),
        "timestamp_ms": event.timestamp_ms(),
        "timecode": format_timecode(event.timestamp),
        "frame_index": event.frame_index,
    })
}

fn summary_line(summary: &SessionSummary) -> String {
    match summary.frame_rate() {
        Ok(rate) => format!(
            "Read {} frames in {:4.2} seconds (avg. {:4.1} FPS).",
            summary.frames_processed,
            summary.elapsed.as_secs_f64(),
            rate
        ),
        Err(_) => format!(
            "Read {} frames in {:4.2} seconds.",
            summary.frames_processed,
            summary.elapsed.as_secs_f64()
        ),
    }
}

fn timecode_list(events: &[FadeEvent]) -> String {
    events
        .iter()
        .map(|event| format_timecode(event.timestamp))
        .collect::<Vec<_>>()
        .join(",")
}

fn scan(args: ScanArgs, global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let strategy = parse_strategy(&args.strategy)
        .ok_or(format!("unsupported --strategy: {}", args.strategy))?;
    let config = DetectionConfig::new()
        .with_intensity_threshold(args.threshold)
        .with_min_dark_percent(args.min_percent)
        .with_block_rows(usize::try_from(args.block_size)?)
        .with_strategy(strategy);
    config.validate()?;

    let mut opened = open_input(&args.input, args.fps, global)?;

    if !args.json {
        println!("Parsing video {}...", args.input.display());
        if let Some((width, height)) = opened.resolution {
            println!("Video Resolution: {width} x {height}");
        }
        println!(
            "Detecting fades with threshold = {}, min percent = {}, block size = {}.\n",
            args.threshold, args.min_percent, args.block_size
        );
    }

    let mut options = SessionOptions::new().with_batch_size(25);
    if let Some(expected) = opened.expected_frames {
        options = options.with_expected_frames(expected);
    }
    if let Some(max_frames) = args.max_frames {
        options = options.with_max_frames(max_frames);
    }
    if let Some(end) = args.until {
        options = options.with_end_time(end);
    }
    if args.start_dark {
        options = options.with_initial_state(FadeState::Dark);
    }

    let bar = if global.progress {
        let bar = progress_bar(opened.expected_frames)?;
        options = options.with_progress(Arc::new(BarProgress { bar: bar.clone() }));
        Some(bar)
    } else {
        None
    };

    let session = DetectionSession::with_options(config, options)?;
    let mut events: Vec<FadeEvent> = Vec::new();
    let mut ordinal = args.start_index;
    let mut sink = |event: FadeEvent| {
        if !args.json {
            let line = event_line(ordinal, &event);
            match &bar {
                Some(bar) => bar.println(line),
                None => println!("{line}"),
            }
        }
        ordinal += 1;
        events.push(event);
    };

    let result = session.run(&mut opened.source, &mut sink);
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    let summary = match result {
        Ok(summary) => summary,
        Err(FadeError::Cancelled) => return Err("scan cancelled".into()),
        Err(error) => return Err(error.into()),
    };

    if args.json {
        let events_json: Vec<Value> = events
            .iter()
            .zip(args.start_index..)
            .map(|(event, ordinal)| event_json(ordinal, event))
            .collect();
        let payload = json!({
            "input": args.input.display().to_string(),
            "config": {
                "threshold": args.threshold,
                "min_percent": args.min_percent,
                "block_size": args.block_size,
                "strategy": args.strategy,
            },
            "events": events_json,
            "timecodes": args.timecodes.then(|| timecode_list(&events)),
            "summary": {
                "frames_processed": summary.frames_processed,
                "dark_frames": summary.dark_frames,
                "events_emitted": summary.events_emitted,
                "elapsed_seconds": summary.elapsed.as_secs_f64(),
                "average_fps": summary.average_fps,
            },
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("{}", "No fades detected.".yellow());
    }
    if args.timecodes && !events.is_empty() {
        println!("\nTimecode list:\n  {}", timecode_list(&events));
    }
    println!("\n{}", summary_line(&summary).green());
    Ok(())
}

fn info(input: &Path, json_output: bool, global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if input.is_dir() {
        let sequence = ImageSequenceSource::open(input, 25.0)?;
        if json_output {
            let payload = json!({
                "input": input.display().to_string(),
                "kind": "image-sequence",
                "frame_count": sequence.len(),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        } else {
            println!("Image sequence: {} frames", sequence.len());
        }
        return Ok(());
    }

    video_info(input, json_output, global)
}

#[cfg(feature = "ffmpeg")]
fn video_info(input: &Path, json_output: bool, _global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let source = VideoFileSource::open(input)?;
    let metadata = source.metadata();
    if json_output {
        let payload = json!({
            "input": input.display().to_string(),
            "kind": "video",
            "width": metadata.width,
            "height": metadata.height,
            "fps": metadata.frames_per_second,
            "frame_count": metadata.frame_count,
            "duration_seconds": metadata.duration.as_secs_f64(),
            "codec": metadata.codec,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Video Resolution: {} x {}", metadata.width, metadata.height);
        println!(
            "Video: {:.3} fps, {} frames, {} [{}]",
            metadata.frames_per_second,
            metadata.frame_count,
            format_timecode(metadata.duration),
            metadata.codec
        );
    }
    Ok(())
}

#[cfg(not(feature = "ffmpeg"))]
fn video_info(input: &Path, _json_output: bool, global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    open_video(input, global).map(|_| ())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Scan(args) => scan(args, &cli.global)?,
        Commands::Info { input, json } => info(&input, json, &cli.global)?,
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "fadescan", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
