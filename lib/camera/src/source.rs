use crate::{CameraError, CameraResult, settings::CameraParameter};
use image_effect::Frame;

/// Anything that can hand out frames one at a time: a live camera, a still
/// image, or a test double.
///
/// A source is opened once, read from any number of times and closed once.
/// `read` never retries; a missing frame is reported as
/// [`CameraError::NoFrameAvailable`] and the caller decides what to do.
pub trait FrameSource {
    fn open(&mut self) -> CameraResult<()>;

    fn read(&mut self) -> CameraResult<Frame>;

    fn close(&mut self) -> CameraResult<()>;

    fn set_parameter(&mut self, parameter: CameraParameter, value: i64) -> CameraResult<()> {
        _ = value;
        Err(CameraError::UnsupportedParameter(
            parameter.name().to_string(),
        ))
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn open(&mut self) -> CameraResult<()> {
        (**self).open()
    }

    fn read(&mut self) -> CameraResult<Frame> {
        (**self).read()
    }

    fn close(&mut self) -> CameraResult<()> {
        (**self).close()
    }

    fn set_parameter(&mut self, parameter: CameraParameter, value: i64) -> CameraResult<()> {
        (**self).set_parameter(parameter, value)
    }
}
