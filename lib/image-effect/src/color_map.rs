//! Pseudo-color lookup tables indexed by luma.

use crate::{Effect, Frame, ImageEffectResult};
use image::{Rgb, RgbImage};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use once_cell::sync::Lazy;

type Lut = [[u8; 3]; 256];

static LUTS: Lazy<Vec<Lut>> = Lazy::new(|| ColorMap::all().iter().map(|m| m.build()).collect());

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ColorMap {
    Autumn = 0,
    Ocean,
    Pink,
}

impl ColorMap {
    pub fn name(&self) -> &'static str {
        match self {
            ColorMap::Autumn => "autumn",
            ColorMap::Ocean => "ocean",
            ColorMap::Pink => "pink",
        }
    }

    pub fn all() -> &'static [ColorMap] {
        &[ColorMap::Autumn, ColorMap::Ocean, ColorMap::Pink]
    }

    /// RGB color for a luma value.
    pub fn lookup(&self, value: u8) -> [u8; 3] {
        let index: u8 = (*self).into();
        LUTS[index as usize][value as usize]
    }

    fn build(&self) -> Lut {
        let mut lut = [[0u8; 3]; 256];

        for (i, slot) in lut.iter_mut().enumerate() {
            let t = i as f32 / 255.0;
            let (r, g, b) = match self {
                ColorMap::Autumn => (1.0, t, 0.0),
                ColorMap::Ocean => (
                    (3.0 * t - 2.0).clamp(0.0, 1.0),
                    ((3.0 * t - 1.0) / 2.0).abs().clamp(0.0, 1.0),
                    t,
                ),
                ColorMap::Pink => {
                    let hot_r = (t / 0.375).min(1.0);
                    let hot_g = ((t - 0.375) / 0.375).clamp(0.0, 1.0);
                    let hot_b = ((t - 0.75) / 0.25).clamp(0.0, 1.0);
                    let pink = |hot: f32| ((2.0 * t + hot) / 3.0).sqrt();
                    (pink(hot_r), pink(hot_g), pink(hot_b))
                }
            };

            *slot = [to_u8(r), to_u8(g), to_u8(b)];
        }

        lut
    }
}

impl Effect for ColorMap {
    fn apply(&self, frame: Frame) -> ImageEffectResult<Frame> {
        let luma = frame.to_luma();
        let out = RgbImage::from_fn(luma.width(), luma.height(), |x, y| {
            Rgb(self.lookup(luma.get_pixel(x, y).0[0]))
        });

        Ok(Frame::from_rgb(out))
    }
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_autumn_endpoints() {
        assert_eq!(ColorMap::Autumn.lookup(0), [255, 0, 0]);
        assert_eq!(ColorMap::Autumn.lookup(255), [255, 255, 0]);
    }

    #[test]
    fn test_ocean_endpoints() {
        assert_eq!(ColorMap::Ocean.lookup(0), [0, 128, 0]);
        assert_eq!(ColorMap::Ocean.lookup(255), [255, 255, 255]);
        assert_eq!(ColorMap::Ocean.lookup(85)[1], 0);
    }

    #[test]
    fn test_pink_is_monotonic() {
        let mut prev = [0u8; 3];
        for v in 0..=255u8 {
            let color = ColorMap::Pink.lookup(v);
            for c in 0..3 {
                assert!(color[c] >= prev[c]);
            }
            prev = color;
        }
        assert_eq!(ColorMap::Pink.lookup(255), [255, 255, 255]);
    }

    #[test]
    fn test_apply_uses_luma() {
        let frame = Frame::from_gray(GrayImage::from_pixel(2, 2, Luma([0])));
        let out = ColorMap::Autumn.apply(frame).unwrap();

        assert_eq!(out.channels(), 3);
        assert!(out.to_rgb_image().pixels().all(|p| p.0 == [255, 0, 0]));
    }

    #[test]
    fn test_primitive_round_trip() {
        for map in ColorMap::all() {
            let raw: u8 = (*map).into();
            assert_eq!(ColorMap::try_from(raw).unwrap(), *map);
        }
    }
}
