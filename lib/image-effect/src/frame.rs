//! Raster frames passed between the frame source, the effects and the display sinks.

use crate::{ImageEffectError, ImageEffectResult};
use image::{GrayImage, Luma, RgbImage};

/// Order of the color planes inside a 3-channel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

impl ChannelOrder {
    /// Sample offsets of the red and blue planes.
    pub fn red_blue(self) -> (usize, usize) {
        match self {
            ChannelOrder::Rgb => (0, 2),
            ChannelOrder::Bgr => (2, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePixels {
    Color(RgbImage),
    Gray(GrayImage),
}

/// A single video frame: either `height x width x 3` color samples or a
/// `height x width` grayscale plane.
///
/// The channel order tag only matters for color buffers; grayscale frames
/// always report [`ChannelOrder::Rgb`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: FramePixels,
    order: ChannelOrder,
}

impl Frame {
    pub fn from_rgb(image: RgbImage) -> Self {
        Self {
            pixels: FramePixels::Color(image),
            order: ChannelOrder::Rgb,
        }
    }

    pub fn from_bgr(image: RgbImage) -> Self {
        Self {
            pixels: FramePixels::Color(image),
            order: ChannelOrder::Bgr,
        }
    }

    pub fn from_gray(image: GrayImage) -> Self {
        Self {
            pixels: FramePixels::Gray(image),
            order: ChannelOrder::Rgb,
        }
    }

    /// Wraps a packed `bgr24` buffer, the layout browser-side video frames arrive in.
    pub fn from_bgr24(width: u32, height: u32, data: Vec<u8>) -> ImageEffectResult<Self> {
        RgbImage::from_raw(width, height, data)
            .map(Self::from_bgr)
            .ok_or_else(|| {
                ImageEffectError::InvalidFrame(format!("buffer does not hold {width}x{height} bgr24"))
            })
    }

    pub fn width(&self) -> u32 {
        match &self.pixels {
            FramePixels::Color(img) => img.width(),
            FramePixels::Gray(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match &self.pixels {
            FramePixels::Color(img) => img.height(),
            FramePixels::Gray(img) => img.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn channels(&self) -> u8 {
        match self.pixels {
            FramePixels::Color(_) => 3,
            FramePixels::Gray(_) => 1,
        }
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn is_gray(&self) -> bool {
        matches!(self.pixels, FramePixels::Gray(_))
    }

    pub fn pixels(&self) -> &FramePixels {
        &self.pixels
    }

    pub fn into_pixels(self) -> FramePixels {
        self.pixels
    }

    /// Reorders a `Bgr` color buffer into `Rgb`. Already `Rgb` frames are returned untouched.
    pub fn into_rgb_order(self) -> Self {
        match (self.pixels, self.order) {
            (FramePixels::Color(mut img), ChannelOrder::Bgr) => {
                for pixel in img.pixels_mut() {
                    pixel.0.swap(0, 2);
                }
                Self::from_rgb(img)
            }
            (pixels, _) => Self {
                pixels,
                order: ChannelOrder::Rgb,
            },
        }
    }

    /// Replicates a grayscale plane into three channels. Color frames pass through.
    pub fn into_color(self) -> Self {
        match self.pixels {
            FramePixels::Gray(gray) => Self::from_rgb(gray_to_rgb(&gray)),
            pixels => Self {
                pixels,
                order: self.order,
            },
        }
    }

    /// Converts to the 3-channel RGB layout image encoders and display sinks expect.
    pub fn to_rgb_image(&self) -> RgbImage {
        match self.clone().into_rgb_order().into_color().pixels {
            FramePixels::Color(img) => img,
            FramePixels::Gray(gray) => gray_to_rgb(&gray),
        }
    }

    /// Luma plane using the BT.601 weights `0.299 R + 0.587 G + 0.114 B`.
    pub fn to_luma(&self) -> GrayImage {
        match &self.pixels {
            FramePixels::Gray(gray) => gray.clone(),
            FramePixels::Color(img) => {
                let (r, b) = self.order.red_blue();
                GrayImage::from_fn(img.width(), img.height(), |x, y| {
                    let p = img.get_pixel(x, y).0;
                    Luma([luma(p[r], p[1], p[b])])
                })
            }
        }
    }

    /// Runs `f` over the raw interleaved samples and rebuilds a frame of the same shape.
    ///
    /// `f` receives the samples, width, height and channel count and must
    /// return exactly as many samples as it was given.
    pub(crate) fn map_samples<F>(self, f: F) -> ImageEffectResult<Self>
    where
        F: FnOnce(&[u8], u32, u32, usize) -> Vec<u8>,
    {
        let (width, height) = self.dimensions();
        let order = self.order;

        let pixels = match self.pixels {
            FramePixels::Color(img) => {
                let samples = f(img.as_raw(), width, height, 3);
                FramePixels::Color(
                    RgbImage::from_raw(width, height, samples)
                        .ok_or_else(|| sample_count_error(width, height, 3))?,
                )
            }
            FramePixels::Gray(img) => {
                let samples = f(img.as_raw(), width, height, 1);
                FramePixels::Gray(
                    GrayImage::from_raw(width, height, samples)
                        .ok_or_else(|| sample_count_error(width, height, 1))?,
                )
            }
        };

        Ok(Self { pixels, order })
    }
}

/// Fixed-point BT.601 luma with round-half-up, so `luma(v, v, v) == v`.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + 8192) >> 14) as u8
}

fn gray_to_rgb(gray: &GrayImage) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        image::Rgb([v, v, v])
    })
}

fn sample_count_error(width: u32, height: u32, channels: usize) -> ImageEffectError {
    ImageEffectError::InvalidFrame(format!(
        "effect returned wrong sample count for {width}x{height}x{channels}"
    ))
}
