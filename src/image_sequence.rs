//! Still-image sequences as a frame source.
//!
//! Frames dumped by other tools (for example `ffmpeg -i in.mp4 frame_%06d.png`)
//! can be analysed without FFmpeg: [`ImageSequenceSource`] lists a directory,
//! keeps the files with a known image extension, sorts them by name and
//! decodes them one at a time with the `image` crate.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FadeError;
use crate::frame::FrameSample;
use crate::source::{FrameSource, SourceFrame, frame_timestamp};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp", "pgm", "ppm"];

/// Frames read from numbered image files.
#[derive(Debug, Clone)]
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    position: usize,
    frames_per_second: f64,
}

impl ImageSequenceSource {
    /// List the images in `directory`, in file-name order.
    ///
    /// # Errors
    ///
    /// Returns [`FadeError::IoError`] if the directory cannot be read and
    /// [`FadeError::InvalidConfig`] if `frames_per_second` is not positive
    /// and finite.
    pub fn open<P: AsRef<Path>>(directory: P, frames_per_second: f64) -> Result<Self, FadeError> {
        let directory = directory.as_ref();
        log::debug!("Listing image sequence in {}", directory.display());

        let mut paths = Vec::new();
        for entry in fs::read_dir(directory)? {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        Self::from_paths(paths, frames_per_second)
    }

    /// Use an explicit list of image files, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`FadeError::InvalidConfig`] if `frames_per_second` is not
    /// positive and finite.
    pub fn from_paths(paths: Vec<PathBuf>, frames_per_second: f64) -> Result<Self, FadeError> {
        if !(frames_per_second.is_finite() && frames_per_second > 0.0) {
            return Err(FadeError::invalid_config(
                "frames_per_second",
                format!("must be positive and finite, got {frames_per_second}"),
            ));
        }

        Ok(Self {
            paths,
            position: 0,
            frames_per_second,
        })
    }

    /// Number of images in the sequence.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// `true` if the sequence has no images.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FadeError> {
        let Some(path) = self.paths.get(self.position) else {
            return Ok(None);
        };

        let image = image::open(path).map_err(|error| {
            FadeError::SourceRead(format!("{}: {error}", path.display()))
        })?;
        let index = self.position as u64;
        self.position += 1;

        Ok(Some(SourceFrame::new(
            FrameSample::from_image(image),
            frame_timestamp(index, self.frames_per_second),
            index,
        )))
    }

    fn frame_count_hint(&self) -> Option<u64> {
        Some(self.paths.len() as u64)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
}
