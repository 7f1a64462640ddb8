use crate::{Effect, Frame, ImageEffectError, ImageEffectResult};
use derivative::Derivative;
use derive_setters::Setters;

/// Gaussian blur with an explicit odd kernel size.
///
/// A `sigma` of zero or less is derived from the kernel size as
/// `0.3 * ((k - 1) / 2 - 1) + 0.8`.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct GaussianBlurConfig {
    #[derivative(Default(value = "3"))]
    kernel_size: u32,

    #[derivative(Default(value = "0.0"))]
    sigma: f32,
}

impl GaussianBlurConfig {
    pub fn new() -> Self {
        Self::default()
    }

    fn kernel(&self) -> ImageEffectResult<Vec<f32>> {
        let size = self.kernel_size;
        if size == 0 || size % 2 == 0 {
            return Err(ImageEffectError::InvalidParameter(format!(
                "gaussian kernel size must be odd, got {size}"
            )));
        }

        let sigma = if self.sigma > 0.0 {
            self.sigma
        } else {
            0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
        };

        let half = (size / 2) as i32;
        let mut weights: Vec<f32> = (-half..=half)
            .map(|x| (-((x * x) as f32) / (2.0 * sigma * sigma)).exp())
            .collect();

        let sum: f32 = weights.iter().sum();
        weights.iter_mut().for_each(|w| *w /= sum);
        Ok(weights)
    }
}

impl Effect for GaussianBlurConfig {
    fn apply(&self, frame: Frame) -> ImageEffectResult<Frame> {
        let kernel = self.kernel()?;
        if kernel.len() == 1 {
            return Ok(frame);
        }

        frame.map_samples(|samples, width, height, channels| {
            separable_blur(samples, width as usize, height as usize, channels, &kernel)
        })
    }
}

fn separable_blur(
    samples: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    kernel: &[f32],
) -> Vec<u8> {
    let half = (kernel.len() / 2) as isize;
    let mut horizontal = vec![0f32; samples.len()];

    for y in 0..height {
        let row = y * width * channels;
        for x in 0..width {
            for c in 0..channels {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = reflect_101(x as isize + k as isize - half, width);
                    acc += weight * samples[row + sx * channels + c] as f32;
                }
                horizontal[row + x * channels + c] = acc;
            }
        }
    }

    let mut out = vec![0u8; samples.len()];
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sy = reflect_101(y as isize + k as isize - half, height);
                    acc += weight * horizontal[(sy * width + x) * channels + c];
                }
                out[(y * width + x) * channels + c] = acc.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    out
}

// Mirrors around the edge sample without repeating it: `dcb|abcd|cba`.
fn reflect_101(mut i: isize, len: usize) -> usize {
    let len = len as isize;
    if len == 1 {
        return 0;
    }

    loop {
        if i < 0 {
            i = -i;
        } else if i >= len {
            i = 2 * len - 2 - i;
        } else {
            return i as usize;
        }
    }
}
