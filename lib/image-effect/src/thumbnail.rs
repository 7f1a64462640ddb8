use crate::{Frame, ImageEffectError, ImageEffectResult};
use fast_image_resize::{PixelType, ResizeAlg, Resizer, images::Image as FastImage};
use image::RgbImage;

/// Downscales a frame so its longest side is at most `max_side`, keeping the aspect ratio.
///
/// Frames already within bounds are converted to RGB and returned at full size.
pub fn thumbnail(frame: &Frame, max_side: u32) -> ImageEffectResult<RgbImage> {
    if max_side == 0 {
        return Err(ImageEffectError::InvalidParameter(
            "thumbnail size must be positive".to_string(),
        ));
    }

    let image = frame.to_rgb_image();
    let (width, height) = image.dimensions();
    let (thumb_w, thumb_h) = fit_within(width, height, max_side);

    if (thumb_w, thumb_h) == (width, height) {
        return Ok(image);
    }

    let src = FastImage::from_vec_u8(width, height, image.into_raw(), PixelType::U8x3)?;
    let mut dst = FastImage::new(thumb_w, thumb_h, PixelType::U8x3);

    let options = fast_image_resize::ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
        fast_image_resize::FilterType::Lanczos3,
    ));
    Resizer::new().resize(&src, &mut dst, &options)?;
    log::debug!("thumbnail {width}x{height} -> {thumb_w}x{thumb_h}");

    RgbImage::from_raw(thumb_w, thumb_h, dst.into_vec()).ok_or_else(|| {
        ImageEffectError::ImageProc(format!("thumbnail buffer mismatch {thumb_w}x{thumb_h}"))
    })
}

fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_side {
        return (width, height);
    }

    let scale = max_side as f64 / longest as f64;
    (
        ((width as f64 * scale).round() as u32).max(1),
        ((height as f64 * scale).round() as u32).max(1),
    )
}
