//! Parallel detection across several video files.
//!
//! Sessions never share state, so independent files can be scanned on the
//! rayon pool with no coordination. Each worker opens its own demuxer and
//! decoder.

use std::path::Path;

use ::rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::config::{DetectionConfig, SessionOptions};
use crate::error::FadeError;
use crate::event::FadeEvent;
use crate::session::DetectionSession;
use crate::stats::SessionSummary;
use crate::video::VideoFileSource;

/// Events and summary of one file.
pub type FileDetection = Result<(Vec<FadeEvent>, SessionSummary), FadeError>;

/// Run one detection session per file on the rayon thread pool.
///
/// Results are returned in the order of `paths`. A failure in one file
/// does not stop the others. Every session receives a clone of `options`,
/// so a shared [`CancellationToken`](crate::CancellationToken) stops all of
/// them and a progress callback sees interleaved reports. `expected_frames`
/// is taken from each file's metadata unless `options` already sets it.
///
/// # Example
///
/// ```no_run
/// use fadescan::{DetectionConfig, SessionOptions, detect_fades_parallel};
///
/// let paths = ["a.mp4", "b.mp4"];
/// for (path, result) in paths.iter().zip(detect_fades_parallel(&paths, DetectionConfig::new(), &SessionOptions::new())) {
///     match result {
///         Ok((events, _)) => println!("{path}: {} transitions", events.len()),
///         Err(error) => eprintln!("{path}: {error}"),
///     }
/// }
/// ```
pub fn detect_fades_parallel<P>(
    paths: &[P],
    config: DetectionConfig,
    options: &SessionOptions,
) -> Vec<FileDetection>
where
    P: AsRef<Path> + Sync,
{
    log::debug!("Scanning {} files in parallel", paths.len());

    paths
        .par_iter()
        .map(|path| detect_file(path.as_ref(), config, options.clone()))
        .collect()
}

fn detect_file(path: &Path, config: DetectionConfig, options: SessionOptions) -> FileDetection {
    let mut source = VideoFileSource::open(path)?;
    let options = match options.expected_frames {
        Some(_) => options,
        None => options.with_expected_frames(source.metadata().frame_count),
    };

    let mut events: Vec<FadeEvent> = Vec::new();
    let summary = DetectionSession::with_options(config, options)?.run(&mut source, &mut events)?;
    Ok((events, summary))
}
