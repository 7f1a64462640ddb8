use crate::{Effect, Frame, ImageEffectError, ImageEffectResult};
use derivative::Derivative;
use derive_setters::Setters;
use image::RgbImage;
use photon_rs::{PhotonImage, monochrome};

/// Collapses a color frame to its single-channel luma plane.
pub fn grayscale(frame: Frame) -> Frame {
    if frame.is_gray() {
        return frame;
    }

    Frame::from_gray(frame.to_luma())
}

/// Spreads the luma histogram over the full 0..=255 range. Output is single channel.
///
/// The darkest level present maps to 0 and the brightest to 255, following
/// `round((cdf(v) - cdf_min) * 255 / (N - cdf_min))`. A frame holding a single
/// level is returned as its luma plane unchanged.
pub fn equalize_histogram(frame: Frame) -> Frame {
    let mut luma = frame.to_luma();
    let hist = &imageproc::stats::histogram(&luma).channels[0];

    let total: u64 = hist.iter().map(|&n| n as u64).sum();
    let Some(first) = hist.iter().position(|&n| n > 0) else {
        return Frame::from_gray(luma);
    };

    let darkest = hist[first] as u64;
    if darkest == total {
        return Frame::from_gray(luma);
    }

    let scale = 255.0 / (total - darkest) as f64;
    let mut lut = [0u8; 256];
    let mut cumulative = 0u64;

    for (v, slot) in lut.iter_mut().enumerate().skip(first + 1) {
        cumulative += hist[v] as u64;
        *slot = (cumulative as f64 * scale).round_ties_even().min(255.0) as u8;
    }

    for p in luma.pixels_mut() {
        p.0[0] = lut[p.0[0] as usize];
    }

    Frame::from_gray(luma)
}

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct SepiaConfig {
    #[derivative(Default(value = "1.0"))]
    intensity: f32,
}

impl SepiaConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for SepiaConfig {
    fn apply(&self, frame: Frame) -> ImageEffectResult<Frame> {
        let original = frame.to_rgb_image();
        let (width, height) = original.dimensions();

        let rgba: Vec<u8> = original
            .pixels()
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect();

        let mut photon_img = PhotonImage::new(rgba, width, height);
        monochrome::sepia(&mut photon_img);
        let sepia_pixels = photon_img.get_raw_pixels();

        let intensity = self.intensity.clamp(0.0, 1.0);
        let mut blended = Vec::with_capacity((width * height * 3) as usize);

        for (original, sepia) in original.pixels().zip(sepia_pixels.chunks_exact(4)) {
            for c in 0..3 {
                let v = original[c] as f32 * (1.0 - intensity) + sepia[c] as f32 * intensity;
                blended.push(v.round().clamp(0.0, 255.0) as u8);
            }
        }

        RgbImage::from_raw(width, height, blended)
            .map(Frame::from_rgb)
            .ok_or_else(|| ImageEffectError::Photon("sepia returned a short buffer".to_string()))
    }
}

/// Canny edge map on the luma plane. Output is single channel, edges at 255.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct EdgeDetectionConfig {
    #[derivative(Default(value = "50.0"))]
    low_threshold: f32,

    #[derivative(Default(value = "150.0"))]
    high_threshold: f32,
}

impl EdgeDetectionConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for EdgeDetectionConfig {
    fn apply(&self, frame: Frame) -> ImageEffectResult<Frame> {
        if self.low_threshold > self.high_threshold {
            return Err(ImageEffectError::InvalidParameter(format!(
                "low threshold {} above high threshold {}",
                self.low_threshold, self.high_threshold
            )));
        }

        let edges = imageproc::edges::canny(
            &frame.to_luma(),
            self.low_threshold,
            self.high_threshold,
        );

        Ok(Frame::from_gray(edges))
    }
}
