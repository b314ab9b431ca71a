//! Decoded frame samples.
//!
//! A [`FrameSample`] is the only view of pixel data the detection core
//! needs: its dimensions and an `(row, col, channel) → u8` accessor over a
//! tightly packed, row-major, channel-interleaved buffer.

use image::DynamicImage;

use crate::error::FadeError;

/// One decoded video frame.
///
/// Samples are stored row by row; within a row, the channels of each pixel
/// are adjacent. A 2×2 RGB frame therefore holds 12 bytes:
/// `R G B R G B` for row 0, then row 1.
///
/// # Example
///
/// ```
/// use fadescan::FrameSample;
///
/// let frame = FrameSample::new(2, 2, 1, vec![0, 10, 20, 30])?;
/// assert_eq!(frame.sample(1, 0, 0), 20);
/// assert_eq!(frame.total_samples(), 4);
/// # Ok::<(), fadescan::FadeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSample {
    rows: usize,
    cols: usize,
    channels: usize,
    data: Vec<u8>,
}

impl FrameSample {
    /// Wrap a packed sample buffer.
    ///
    /// # Errors
    ///
    /// Returns [`FadeError::InvalidFrame`] if `data.len()` is not
    /// `rows * cols * channels`. Zero dimensions are accepted here and
    /// rejected when the frame is classified.
    pub fn new(rows: usize, cols: usize, channels: usize, data: Vec<u8>) -> Result<Self, FadeError> {
        let expected = rows
            .checked_mul(cols)
            .and_then(|pixels| pixels.checked_mul(channels))
            .ok_or_else(|| {
                FadeError::InvalidFrame(format!(
                    "dimensions {rows}x{cols}x{channels} overflow the sample count"
                ))
            })?;

        if data.len() != expected {
            return Err(FadeError::InvalidFrame(format!(
                "buffer holds {} samples but {rows}x{cols}x{channels} requires {expected}",
                data.len()
            )));
        }

        Ok(Self {
            rows,
            cols,
            channels,
            data,
        })
    }

    /// A frame where every sample has the same intensity.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols * channels` overflows `usize`.
    pub fn filled(rows: usize, cols: usize, channels: usize, value: u8) -> Self {
        let total = rows
            .checked_mul(cols)
            .and_then(|pixels| pixels.checked_mul(channels));
        let Some(total) = total else {
            panic!("dimensions {rows}x{cols}x{channels} overflow the sample count");
        };

        Self {
            rows,
            cols,
            channels,
            data: vec![value; total],
        }
    }

    /// Convert a decoded image.
    ///
    /// Alpha is not an intensity and is dropped: gray images become one
    /// channel, everything else 8-bit RGB.
    pub fn from_image(image: DynamicImage) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let (channels, data) = match image {
            DynamicImage::ImageLuma8(buffer) => (1, buffer.into_raw()),
            DynamicImage::ImageRgb8(buffer) => (3, buffer.into_raw()),
            gray @ DynamicImage::ImageLumaA8(_) => (1, gray.into_luma8().into_raw()),
            other => (3, other.into_rgb8().into_raw()),
        };

        Self {
            rows: height,
            cols: width,
            channels,
            data,
        }
    }

    /// Number of pixel rows (frame height).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of pixel columns (frame width).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Total number of samples (`rows * cols * channels`).
    pub fn total_samples(&self) -> usize {
        self.data.len()
    }

    /// Number of samples in one row.
    pub fn row_stride(&self) -> usize {
        self.cols * self.channels
    }

    /// Intensity of a single sample.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is out of range.
    pub fn sample(&self, row: usize, col: usize, channel: usize) -> u8 {
        assert!(
            row < self.rows && col < self.cols && channel < self.channels,
            "sample ({row}, {col}, {channel}) outside {}x{}x{} frame",
            self.rows,
            self.cols,
            self.channels
        );
        self.data[row * self.row_stride() + col * self.channels + channel]
    }

    /// The samples of rows `start..end`, clamped to the frame height.
    pub fn rows_slice(&self, start: usize, end: usize) -> &[u8] {
        let stride = self.row_stride();
        let end = end.min(self.rows);
        let start = start.min(end);
        &self.data[start * stride..end * stride]
    }

    /// The full packed sample buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

}

impl From<DynamicImage> for FrameSample {
    fn from(image: DynamicImage) -> Self {
        FrameSample::from_image(image)
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayAlphaImage, GrayImage, Luma, LumaA, Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        let result = FrameSample::new(2, 2, 3, vec![0; 11]);
        assert!(matches!(result, Err(FadeError::InvalidFrame(_))));
    }

    #[test]
    fn zero_dimensions_are_representable() {
        let frame = FrameSample::new(0, 10, 3, Vec::new()).unwrap();
        assert_eq!(frame.total_samples(), 0);
    }

    #[test]
    fn sample_addressing_is_row_major_interleaved() {
        let data: Vec<u8> = (0..12).collect();
        let frame = FrameSample::new(2, 2, 3, data).unwrap();
        assert_eq!(frame.sample(0, 0, 0), 0);
        assert_eq!(frame.sample(0, 1, 2), 5);
        assert_eq!(frame.sample(1, 0, 1), 7);
        assert_eq!(frame.sample(1, 1, 2), 11);
    }

    #[test]
    fn rows_slice_clamps_to_height() {
        let frame = FrameSample::filled(5, 4, 1, 7);
        assert_eq!(frame.rows_slice(0, 2).len(), 8);
        assert_eq!(frame.rows_slice(4, 32).len(), 4);
        assert!(frame.rows_slice(9, 12).is_empty());
    }

    #[test]
    fn from_gray_image_keeps_one_channel() {
        let image = GrayImage::from_pixel(3, 2, Luma([42]));
        let frame = FrameSample::from_image(DynamicImage::ImageLuma8(image));
        assert_eq!((frame.rows(), frame.cols(), frame.channels()), (2, 3, 1));
        assert!(frame.as_bytes().iter().all(|&value| value == 42));
    }

    #[test]
    fn from_rgb_image_keeps_three_channels() {
        let image = RgbImage::from_pixel(4, 1, Rgb([1, 2, 3]));
        let frame: FrameSample = DynamicImage::ImageRgb8(image).into();
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.sample(0, 3, 2), 3);
    }

    #[test]
    fn alpha_channels_are_dropped() {
        let rgba = RgbaImage::from_pixel(2, 2, Rgba([9u8, 8, 7, 255]));
        let frame = FrameSample::from_image(DynamicImage::ImageRgba8(rgba));
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.as_bytes(), &[9u8, 8, 7].repeat(4)[..]);

        let gray_alpha = GrayAlphaImage::from_pixel(2, 1, LumaA([3, 255]));
        let frame = FrameSample::from_image(DynamicImage::ImageLumaA8(gray_alpha));
        assert_eq!(frame.channels(), 1);
        assert_eq!(frame.as_bytes(), &[3, 3]);
    }

    #[test]
    #[should_panic(expected = "overflow")]
    fn filled_rejects_overflowing_dimensions() {
        let _ = FrameSample::filled(usize::MAX, 2, 1, 0);
    }

    #[test]
    fn other_color_types_convert_to_rgb() {
        let image = DynamicImage::new_luma16(2, 2);
        let frame = FrameSample::from_image(image);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.total_samples(), 12);
    }
}
