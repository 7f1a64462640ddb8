use crate::{Effect, Frame, ImageEffectError, ImageEffectResult, frame::FramePixels};
use derivative::Derivative;
use derive_setters::Setters;
use image::imageops;

/// Center crop to a target aspect ratio.
///
/// Frames that are already as wide as the target, or wider, are returned
/// unchanged. The crop window is recomputed from every input frame.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct WidescreenConfig {
    #[derivative(Default(value = "16"))]
    aspect_width: u32,

    #[derivative(Default(value = "9"))]
    aspect_height: u32,
}

impl WidescreenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output size for an input of `width x height`.
    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        let (aw, ah) = (self.aspect_width as u64, self.aspect_height as u64);
        let (w, h) = (width as u64, height as u64);

        if w * ah >= h * aw {
            return (width, height);
        }

        (width, ((w * ah / aw) as u32).max(1))
    }
}

impl Effect for WidescreenConfig {
    fn apply(&self, frame: Frame) -> ImageEffectResult<Frame> {
        if self.aspect_width == 0 || self.aspect_height == 0 {
            return Err(ImageEffectError::InvalidParameter(format!(
                "invalid aspect ratio {}:{}",
                self.aspect_width, self.aspect_height
            )));
        }

        let (width, height) = frame.dimensions();
        let (out_w, out_h) = self.output_size(width, height);
        if (out_w, out_h) == (width, height) {
            return Ok(frame);
        }

        let top = (height - out_h) / 2;
        let order = frame.order();

        Ok(match frame.into_pixels() {
            FramePixels::Color(img) => {
                let cropped = imageops::crop_imm(&img, 0, top, out_w, out_h).to_image();
                match order {
                    crate::ChannelOrder::Rgb => Frame::from_rgb(cropped),
                    crate::ChannelOrder::Bgr => Frame::from_bgr(cropped),
                }
            }
            FramePixels::Gray(img) => {
                Frame::from_gray(imageops::crop_imm(&img, 0, top, out_w, out_h).to_image())
            }
        })
    }
}
