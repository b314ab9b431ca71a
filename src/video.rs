//! FFmpeg-backed video file source.
//!
//! [`VideoFileSource`] opens a media file, picks the best video stream and
//! decodes it front to back. Each decoded frame is converted to a packed
//! 8-bit [`FrameSample`] (RGB by default, or grayscale) and returned with a
//! timestamp measured from the first decoded frame.
//!
//! This module is available when the `ffmpeg` feature is enabled (it is on
//! by default).
//!
//! # Example
//!
//! ```no_run
//! use fadescan::{DetectionConfig, FadeError, VideoFileSource, detect_fades};
//!
//! let mut source = VideoFileSource::open("input.mp4")?;
//! let metadata = source.metadata().clone();
//! println!("Video Resolution: {} x {}", metadata.width, metadata.height);
//!
//! let (events, summary) = detect_fades(&mut source, DetectionConfig::new())?;
//! for event in &events {
//!     println!("{event}");
//! }
//! println!("{} frames", summary.frames_processed);
//! # Ok::<(), FadeError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::error::FadeError;
use crate::frame::FrameSample;
use crate::source::{FrameSource, SourceFrame, frame_timestamp};

/// Sample layout of decoded frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB, three samples per pixel. This is the default.
    #[default]
    Rgb8,
    /// 8-bit luma only, one sample per pixel. Roughly three times less
    /// work per frame.
    Gray8,
}

impl PixelFormat {
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }

    /// Samples per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Properties of the decoded video stream.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Total number of frames, from the container or estimated from the
    /// duration.
    pub frame_count: u64,
    /// Container duration.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
}

/// Decodes a video file frame by frame.
pub struct VideoFileSource {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: Option<ScalingContext>,
    scaler_input: Option<(Pixel, u32, u32)>,
    video_stream_index: usize,
    time_base: Rational,
    metadata: VideoMetadata,
    pixel_format: PixelFormat,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    start_pts: Option<i64>,
    next_index: u64,
    eof_sent: bool,
    done: bool,
    file_path: PathBuf,
}

impl Debug for VideoFileSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFileSource")
            .field("file_path", &self.file_path)
            .field("metadata", &self.metadata)
            .field("pixel_format", &self.pixel_format)
            .field("video_stream_index", &self.video_stream_index)
            .field("next_index", &self.next_index)
            .finish_non_exhaustive()
    }
}

impl VideoFileSource {
    /// Open a file and decode it to RGB frames.
    ///
    /// # Errors
    ///
    /// Returns [`FadeError::FileOpen`] if the file cannot be opened and
    /// [`FadeError::NoVideoStream`] if it has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FadeError> {
        Self::open_with_format(path, PixelFormat::default())
    }

    /// Open a file and decode it to the given sample layout.
    ///
    /// # Errors
    ///
    /// Same as [`open`](VideoFileSource::open).
    pub fn open_with_format<P: AsRef<Path>>(
        path: P,
        pixel_format: PixelFormat,
    ) -> Result<Self, FadeError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening video file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| FadeError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| FadeError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(FadeError::NoVideoStream)?;
        let video_stream_index = stream.index();
        let time_base = stream.time_base();

        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 && frame_rate.numerator() > 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 && rate.numerator() > 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else {
            (duration.as_secs_f64() * frames_per_second) as u64
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
        };

        log::debug!(
            "Video stream {video_stream_index}: {}x{} @ {:.3} fps, ~{} frames ({})",
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler: None,
            scaler_input: None,
            video_stream_index,
            time_base,
            metadata,
            pixel_format,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            start_pts: None,
            next_index: 0,
            eof_sent: false,
            done: false,
            file_path,
        })
    }

    /// Stream properties read when the file was opened.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Sample layout of produced frames.
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Convert the frame currently held in `decoded_frame`.
    fn convert_current_frame(&mut self) -> Result<SourceFrame, FadeError> {
        let width = self.decoded_frame.width();
        let height = self.decoded_frame.height();
        let input = (self.decoded_frame.format(), width, height);

        // Some decoders switch pixel format or size mid-stream; the scaler
        // must match the frame it is fed.
        if self.scaler_input != Some(input) {
            self.scaler = Some(ScalingContext::get(
                input.0,
                width,
                height,
                self.pixel_format.to_ffmpeg_pixel(),
                width,
                height,
                ScalingFlags::BILINEAR,
            )?);
            self.scaler_input = Some(input);
        }

        let scaler = self
            .scaler
            .as_mut()
            .ok_or_else(|| FadeError::VideoDecodeError("Scaler not initialised".to_string()))?;
        scaler.run(&self.decoded_frame, &mut self.scaled_frame)?;

        let channels = self.pixel_format.channels();
        let buffer = crate::conversion::frame_to_buffer(&self.scaled_frame, width, height, channels);
        let sample = FrameSample::new(height as usize, width as usize, channels, buffer)?;

        let index = self.next_index;
        self.next_index += 1;

        let timestamp = match self.decoded_frame.timestamp().or(self.decoded_frame.pts()) {
            Some(pts) => {
                let start = *self.start_pts.get_or_insert(pts);
                crate::conversion::pts_offset_to_duration(pts, start, self.time_base)
            }
            None if self.metadata.frames_per_second > 0.0 => {
                frame_timestamp(index, self.metadata.frames_per_second)
            }
            None => Duration::ZERO,
        };

        Ok(SourceFrame::new(sample, timestamp, index))
    }
}

impl FrameSource for VideoFileSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>, FadeError> {
        if self.done {
            return Ok(None);
        }

        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                return match self.convert_current_frame() {
                    Ok(frame) => Ok(Some(frame)),
                    Err(error) => {
                        self.done = true;
                        Err(error)
                    }
                };
            }

            if self.eof_sent {
                log::debug!(
                    "Decoded {} frames from {}",
                    self.next_index,
                    self.file_path.display()
                );
                self.done = true;
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index
                        && let Err(error) = self.decoder.send_packet(&packet)
                    {
                        self.done = true;
                        return Err(FadeError::VideoDecodeError(error.to_string()));
                    }
                }
                Err(FfmpegError::Eof) => {
                    if let Err(error) = self.decoder.send_eof() {
                        self.done = true;
                        return Err(FadeError::from(error));
                    }
                    self.eof_sent = true;
                }
                Err(error) => {
                    self.done = true;
                    return Err(FadeError::SourceRead(format!(
                        "{}: {error}",
                        self.file_path.display()
                    )));
                }
            }
        }
    }

    fn frame_count_hint(&self) -> Option<u64> {
        (self.metadata.frame_count > 0).then_some(self.metadata.frame_count)
    }
}
