pub mod camera_client;
pub mod camera_info;
pub mod settings;
pub mod source;
pub mod still_source;

pub use camera_client::{CameraConfig, CameraSource};
pub use camera_info::CameraInfo;
pub use nokhwa::utils::CameraIndex;
pub use settings::{CameraParameter, DeviceSettings, configure};
pub use source::FrameSource;
pub use still_source::StillSource;

pub type CameraResult<T> = Result<T, CameraError>;

#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    #[error("Failed to initialize camera: {0}")]
    InitializationError(String),

    #[error("Failed to start camera: {0}")]
    StartError(String),

    #[error("Failed to stop camera: {0}")]
    StopError(String),

    #[error("Camera is not open")]
    NotOpen,

    #[error("No frame available")]
    NoFrameAvailable,

    #[error("Invalid camera index: {0}")]
    InvalidCameraIndex(u32),

    #[error("Unsupported camera parameter: {0}")]
    UnsupportedParameter(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageLibraryError(#[from] image::ImageError),

    #[error("Camera error: {0}")]
    NokhwaError(#[from] nokhwa::NokhwaError),
}

impl CameraError {
    /// Errors that only cost the current frame; the feed keeps going.
    pub fn is_transient(&self) -> bool {
        matches!(self, CameraError::NoFrameAvailable)
    }
}

pub fn init() {
    #[cfg(target_os = "macos")]
    nokhwa::nokhwa_initialize(|granted| {
        log::info!("User said {} for nokhwa", granted);
    });
}
