use crate::{Effect, Frame, ImageEffectResult, frame::FramePixels};
use derivative::Derivative;
use derive_setters::Setters;

/// Saturating `|alpha * v + beta|` applied to every sample, halves rounded to even.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct ScaleConfig {
    #[derivative(Default(value = "1.0"))]
    alpha: f32,

    #[derivative(Default(value = "0.0"))]
    beta: f32,
}

impl ScaleConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for ScaleConfig {
    fn apply(&self, frame: Frame) -> ImageEffectResult<Frame> {
        let lut = scale_lut(self.alpha, self.beta);
        frame.map_samples(|samples, _, _, _| samples.iter().map(|&v| lut[v as usize]).collect())
    }
}

/// Per-channel gains on the red and blue planes, green untouched.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct WhiteBalanceConfig {
    #[derivative(Default(value = "1.0"))]
    red_gain: f32,

    #[derivative(Default(value = "1.0"))]
    blue_gain: f32,
}

impl WhiteBalanceConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for WhiteBalanceConfig {
    fn apply(&self, frame: Frame) -> ImageEffectResult<Frame> {
        let frame = frame.into_color();
        let (r, b) = frame.order().red_blue();
        let red = scale_lut(self.red_gain, 0.0);
        let blue = scale_lut(self.blue_gain, 0.0);

        frame.map_samples(|samples, _, _, channels| {
            let mut out = samples.to_vec();
            for pixel in out.chunks_exact_mut(channels) {
                pixel[r] = red[pixel[r] as usize];
                pixel[b] = blue[pixel[b] as usize];
            }
            out
        })
    }
}

/// Exchanges the red and blue planes while keeping the channel order tag.
pub fn swap_red_blue(frame: Frame) -> ImageEffectResult<Frame> {
    if matches!(frame.pixels(), FramePixels::Gray(_)) {
        return Ok(frame);
    }

    frame.map_samples(|samples, _, _, channels| {
        let mut out = samples.to_vec();
        for pixel in out.chunks_exact_mut(channels) {
            pixel.swap(0, 2);
        }
        out
    })
}

fn scale_lut(alpha: f32, beta: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (v, slot) in lut.iter_mut().enumerate() {
        *slot = (alpha * v as f32 + beta).abs().round_ties_even().min(255.0) as u8;
    }
    lut
}
