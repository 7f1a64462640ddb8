use crate::{CameraError, CameraResult, FrameSource};
use image_effect::Frame;
use std::path::{Path, PathBuf};

/// Serves one decoded image file as an endless feed.
///
/// Used for uploaded pictures: the same frame is handed out on every read.
#[derive(Debug, Clone)]
pub struct StillSource {
    path: PathBuf,
    frame: Option<Frame>,
}

impl StillSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            frame: None,
        }
    }

    /// Wraps an already decoded frame. `open` is then a no-op.
    pub fn from_frame(frame: Frame) -> Self {
        Self {
            path: PathBuf::new(),
            frame: Some(frame),
        }
    }
}

impl FrameSource for StillSource {
    fn open(&mut self) -> CameraResult<()> {
        if self.frame.is_some() {
            return Ok(());
        }

        let image = image::ImageReader::open(&self.path)?
            .with_guessed_format()?
            .decode()?
            .to_rgb8();

        log::info!(
            "loaded {} ({}x{})",
            self.path.display(),
            image.width(),
            image.height()
        );

        self.frame = Some(Frame::from_rgb(image));
        Ok(())
    }

    fn read(&mut self) -> CameraResult<Frame> {
        self.frame.clone().ok_or(CameraError::NoFrameAvailable)
    }

    fn close(&mut self) -> CameraResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_read_before_open_is_unavailable() {
        let mut source = StillSource::new("missing.png");
        assert!(matches!(source.read(), Err(CameraError::NoFrameAvailable)));
    }

    #[test]
    fn test_missing_file_fails_to_open() {
        let mut source = StillSource::new("/nonexistent/dir/frame.png");
        assert!(source.open().is_err());
    }

    #[test]
    fn test_serves_file_repeatedly() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("frame.png");
        RgbImage::from_pixel(6, 4, Rgb([10, 20, 30])).save(&path)?;

        let mut source = StillSource::new(&path);
        source.open()?;
        let first = source.read()?;
        let second = source.read()?;

        assert_eq!(first, second);
        assert_eq!(first.dimensions(), (6, 4));
        Ok(())
    }

    #[test]
    fn test_parameters_unsupported() {
        let mut source = StillSource::from_frame(Frame::from_rgb(RgbImage::new(1, 1)));
        assert!(matches!(
            source.set_parameter(crate::CameraParameter::Gain, 3),
            Err(CameraError::UnsupportedParameter(_))
        ));
    }
}
