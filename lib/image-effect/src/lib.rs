pub mod blur;
pub mod color_map;
pub mod frame;
pub mod geometry;
pub mod monochrome;
pub mod thumbnail;
pub mod tone;

pub use frame::{ChannelOrder, Frame, FramePixels};

pub type ImageEffectResult<T> = Result<T, ImageEffectError>;

#[derive(thiserror::Error, Debug)]
pub enum ImageEffectError {
    #[error("Photon error: {0}")]
    Photon(String),
    #[error("Image processing error: {0}")]
    ImageProc(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Fast image buffer error: {0}")]
    FastImageBuffer(#[from] fast_image_resize::ImageBufferError),
    #[error("Fast image resize error: {0}")]
    FastImageResize(#[from] fast_image_resize::ResizeError),
}

pub trait Effect {
    fn apply(&self, frame: Frame) -> ImageEffectResult<Frame>;
}

/// One built-in frame operation. Camera modes chain one or two of these.
#[derive(Debug, Clone)]
pub enum ImageEffect {
    // Tone
    Scale(tone::ScaleConfig),
    WhiteBalance(tone::WhiteBalanceConfig),
    SwapRedBlue,

    // Blur
    GaussianBlur(blur::GaussianBlurConfig),

    // Monochrome
    Grayscale,
    ExpandToColor,
    EqualizeHistogram,
    Sepia(monochrome::SepiaConfig),
    EdgeDetection(monochrome::EdgeDetectionConfig),

    // Lookup tables
    ColorMap(color_map::ColorMap),

    // Geometry
    Widescreen(geometry::WidescreenConfig),
}

impl Effect for ImageEffect {
    fn apply(&self, frame: Frame) -> ImageEffectResult<Frame> {
        match self {
            ImageEffect::Scale(config) => config.apply(frame),
            ImageEffect::WhiteBalance(config) => config.apply(frame),
            ImageEffect::SwapRedBlue => tone::swap_red_blue(frame),

            ImageEffect::GaussianBlur(config) => config.apply(frame),

            ImageEffect::Grayscale => Ok(monochrome::grayscale(frame)),
            ImageEffect::ExpandToColor => Ok(frame.into_color()),
            ImageEffect::EqualizeHistogram => Ok(monochrome::equalize_histogram(frame)),
            ImageEffect::Sepia(config) => config.apply(frame),
            ImageEffect::EdgeDetection(config) => config.apply(frame),

            ImageEffect::ColorMap(map) => map.apply(frame),

            ImageEffect::Widescreen(config) => config.apply(frame),
        }
    }
}

impl ImageEffect {
    pub fn name(&self) -> &'static str {
        match self {
            ImageEffect::Scale(_) => "scale",
            ImageEffect::WhiteBalance(_) => "white-balance",
            ImageEffect::SwapRedBlue => "swap-red-blue",
            ImageEffect::GaussianBlur(_) => "gaussian-blur",
            ImageEffect::Grayscale => "grayscale",
            ImageEffect::ExpandToColor => "expand-to-color",
            ImageEffect::EqualizeHistogram => "equalize-histogram",
            ImageEffect::Sepia(_) => "sepia",
            ImageEffect::EdgeDetection(_) => "edge-detection",
            ImageEffect::ColorMap(map) => map.name(),
            ImageEffect::Widescreen(_) => "widescreen",
        }
    }
}

/// Runs `effects` left to right, threading the frame through each one.
pub fn apply_chain(effects: &[ImageEffect], frame: Frame) -> ImageEffectResult<Frame> {
    effects
        .iter()
        .try_fold(frame, |frame, effect| effect.apply(frame))
}
