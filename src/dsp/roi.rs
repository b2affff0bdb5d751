//! Central-square region of interest and per-frame colour means.
//!
//! Frames arrive already decoded; container decoding happens upstream.
use std::path::Path;

use image::RgbImage;
use log::debug;

use crate::dsp::VitalsError;
use crate::types::{ClipRecording, ColorSample};

/// Pixel rectangle `(x, y, side)` of a square ROI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoiRect {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

/// Square of side `fraction * min(width, height)` centred in the frame.
pub fn center_square_roi(width: u32, height: u32, fraction: f64) -> RoiRect {
    let side = ((width.min(height) as f64) * fraction.clamp(0.0, 1.0)) as u32;
    let side = side.max(1).min(width.min(height));
    RoiRect {
        x: width / 2 - side / 2,
        y: height / 2 - side / 2,
        side,
    }
}

/// Mean red, green and blue over `roi`.
pub fn mean_color(frame: &RgbImage, roi: RoiRect) -> ColorSample {
    let mut sums = [0u64; 3];
    for y in roi.y..roi.y + roi.side {
        for x in roi.x..roi.x + roi.side {
            let pixel = frame.get_pixel(x, y);
            for (sum, channel) in sums.iter_mut().zip(pixel.0) {
                *sum += channel as u64;
            }
        }
    }
    let count = (roi.side as u64 * roi.side as u64).max(1) as f64;
    ColorSample {
        red: sums[0] as f64 / count,
        green: sums[1] as f64 / count,
        blue: sums[2] as f64 / count,
    }
}

/// Accumulates one colour sample per frame into a clip.
pub struct FrameSampler {
    roi_fraction: f64,
    frame_size: Option<(u32, u32)>,
    clip: ClipRecording,
}

impl FrameSampler {
    pub fn new(label: impl Into<String>, sample_rate_hz: Option<f64>, roi_fraction: f64) -> Self {
        Self {
            roi_fraction,
            frame_size: None,
            clip: ClipRecording::new(label, sample_rate_hz),
        }
    }

    /// Frames must keep the size of the first one.
    pub fn push_frame(&mut self, frame: &RgbImage) -> Result<ColorSample, VitalsError> {
        let size = frame.dimensions();
        let expected = *self.frame_size.get_or_insert(size);
        if size != expected {
            return Err(VitalsError::FrameSizeMismatch {
                index: self.clip.frame_count(),
                expected,
                actual: size,
            });
        }
        let roi = center_square_roi(size.0, size.1, self.roi_fraction);
        let sample = mean_color(frame, roi);
        self.clip.push(sample);
        Ok(sample)
    }

    pub fn push_image_file(&mut self, path: impl AsRef<Path>) -> Result<ColorSample, VitalsError> {
        let frame = image::open(path.as_ref())?.to_rgb8();
        self.push_frame(&frame)
    }

    pub fn finish(self) -> ClipRecording {
        debug!(
            "sampled '{}': {} frames",
            self.clip.label,
            self.clip.frame_count()
        );
        self.clip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    #[test]
    fn roi_is_centred_square() {
        let roi = center_square_roi(640, 480, 0.33);
        assert_eq!(roi.side, 158);
        assert_eq!(roi, RoiRect { x: 241, y: 161, side: 158 });
        let full = center_square_roi(10, 10, 1.0);
        assert_eq!(full, RoiRect { x: 0, y: 0, side: 10 });
    }
    #[test]
    fn mean_ignores_pixels_outside_roi() {
        let mut frame = RgbImage::from_pixel(9, 9, Rgb([255, 255, 255]));
        let roi = center_square_roi(9, 9, 0.34);
        for y in roi.y..roi.y + roi.side {
            for x in roi.x..roi.x + roi.side {
                frame.put_pixel(x, y, Rgb([200, 100, 50]));
            }
        }
        let sample = mean_color(&frame, roi);
        assert_eq!(sample, ColorSample { red: 200.0, green: 100.0, blue: 50.0 });
    }
    #[test]
    fn sampler_rejects_resized_frames() {
        let mut sampler = FrameSampler::new("face_rest", Some(30.0), 0.33);
        sampler.push_frame(&RgbImage::new(32, 24)).unwrap();
        sampler.push_frame(&RgbImage::new(32, 24)).unwrap();
        let err = sampler.push_frame(&RgbImage::new(24, 32)).unwrap_err();
        assert!(matches!(err, VitalsError::FrameSizeMismatch { index: 2, .. }));
        let clip = sampler.finish();
        assert_eq!(clip.frame_count(), 2);
        assert_eq!(clip.blue.as_ref().map(Vec::len), Some(2));
    }
}
