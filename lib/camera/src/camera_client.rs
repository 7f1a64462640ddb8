use crate::{CameraError, CameraResult, FrameSource, settings::CameraParameter};
use derivative::Derivative;
use derive_setters::Setters;
use image_effect::Frame;
use nokhwa::{
    CallbackCamera,
    pixel_format::RgbFormat,
    utils::{
        CameraIndex, ControlValueSetter, KnownCameraControl, RequestedFormat,
        RequestedFormatType, Resolution,
    },
};

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct CameraConfig {
    #[derivative(Default(value = "None"))]
    #[setters[strip_option]]
    pub fps: Option<u32>,

    #[derivative(Default(value = "None"))]
    #[setters[strip_option]]
    pub width: Option<u32>,

    #[derivative(Default(value = "None"))]
    #[setters[strip_option]]
    pub height: Option<u32>,
}

/// Live camera frames through nokhwa.
///
/// The device is only touched in [`FrameSource::open`]; dropping an open
/// source stops the stream and releases the device.
pub struct CameraSource {
    index: CameraIndex,
    config: CameraConfig,
    camera: Option<CallbackCamera>,
}

impl CameraSource {
    pub fn new(index: CameraIndex, config: CameraConfig) -> Self {
        Self {
            index,
            config,
            camera: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.camera.is_some()
    }

    fn camera_mut(&mut self) -> CameraResult<&mut CallbackCamera> {
        self.camera.as_mut().ok_or(CameraError::NotOpen)
    }
}

impl FrameSource for CameraSource {
    fn open(&mut self) -> CameraResult<()> {
        if self.camera.is_some() {
            return Ok(());
        }

        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = CallbackCamera::new(self.index.clone(), format, move |_| {})
            .map_err(|e| CameraError::InitializationError(e.to_string()))?;

        if let Some(fps) = self.config.fps
            && let Err(e) = camera.set_frame_rate(fps)
        {
            log::warn!("camera set frame rate ({fps}) failed: {e}");
        }

        if let Some(w) = self.config.width
            && let Some(h) = self.config.height
            && let Err(e) = camera.set_resolution(Resolution::new(w, h))
        {
            log::warn!("camera set resolution ({w} x {h}) failed: {e}");
        }

        camera
            .open_stream()
            .map_err(|e| CameraError::StartError(e.to_string()))?;

        log::info!("camera {} opened", self.index);
        self.camera = Some(camera);
        Ok(())
    }

    fn read(&mut self) -> CameraResult<Frame> {
        let buffer = self
            .camera_mut()?
            .last_frame()
            .map_err(|_| CameraError::NoFrameAvailable)?;

        let image = buffer
            .decode_image::<RgbFormat>()
            .map_err(|_| CameraError::NoFrameAvailable)?;

        if image.is_empty() {
            return Err(CameraError::NoFrameAvailable);
        }

        Ok(Frame::from_rgb(image))
    }

    fn close(&mut self) -> CameraResult<()> {
        let Some(mut camera) = self.camera.take() else {
            return Ok(());
        };

        camera
            .stop_stream()
            .map_err(|e| CameraError::StopError(e.to_string()))?;

        log::info!("camera {} closed", self.index);
        Ok(())
    }

    fn set_parameter(&mut self, parameter: CameraParameter, value: i64) -> CameraResult<()> {
        let control = match parameter {
            CameraParameter::Brightness => KnownCameraControl::Brightness,
            CameraParameter::Contrast => KnownCameraControl::Contrast,
            CameraParameter::Exposure => KnownCameraControl::Exposure,
            CameraParameter::Gain => KnownCameraControl::Gain,
        };

        self.camera_mut()?
            .set_camera_control(control, ControlValueSetter::Integer(value))
            .map_err(CameraError::from)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("{e}");
        }
    }
}
