//! Saving processed frames as timestamped PNG files.

use chrono::{Local, NaiveDateTime};
use image::{ExtendedColorType, ImageEncoder, RgbImage, codecs::png::PngEncoder};
use image_effect::Frame;
use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

const MAX_SAME_SECOND: u32 = 1000;

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("create {path} failed: {source}")]
    Create { path: PathBuf, source: io::Error },

    #[error("write {path} failed: {source}")]
    Write {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("too many captures named {0} in one second")]
    Exhausted(String),
}

/// A written capture. `id` is the file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub id: String,
    pub path: PathBuf,
}

pub struct SnapshotWriter<C: Clock = SystemClock> {
    dir: PathBuf,
    clock: C,
}

impl SnapshotWriter<SystemClock> {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_clock(dir, SystemClock)
    }
}

impl<C: Clock> SnapshotWriter<C> {
    pub fn with_clock(dir: impl AsRef<Path>, clock: C) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            clock,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `frame` as `capture_<YYYYMMDD_HHMMSS>.png`.
    ///
    /// A second capture in the same second gets `_1`, then `_2` and so on.
    /// Existing files are never overwritten. Failures are returned as-is and
    /// not retried, and a partly written file is removed.
    pub fn save(&self, frame: &Frame) -> Result<Artifact, SnapshotError> {
        let stem = format!("capture_{}", self.clock.now().format("%Y%m%d_%H%M%S"));
        let (artifact, file) = self.create_unique(&stem)?;

        if let Err(e) = write_png(&frame.to_rgb_image(), file) {
            _ = fs::remove_file(&artifact.path);
            return Err(SnapshotError::Write {
                path: artifact.path,
                source: e,
            });
        }

        log::info!("saved capture {}", artifact.path.display());
        Ok(artifact)
    }

    fn create_unique(&self, stem: &str) -> Result<(Artifact, File), SnapshotError> {
        for n in 0..MAX_SAME_SECOND {
            let id = match n {
                0 => stem.to_string(),
                _ => format!("{stem}_{n}"),
            };
            let path = self.dir.join(format!("{id}.png"));

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((Artifact { id, path }, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(SnapshotError::Create { path, source: e }),
            }
        }

        Err(SnapshotError::Exhausted(stem.to_string()))
    }
}

/// Encodes `image` as PNG into `out`. Buffered bytes are flushed before
/// returning so a failing final write is reported.
fn write_png<W: Write>(image: &RgbImage, out: W) -> image::ImageResult<()> {
    let mut writer = BufWriter::new(out);

    PngEncoder::new(&mut writer).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    struct FixedClock(NaiveDateTime);

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            self.0
        }
    }

    fn clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2026, 10, 18)
                .unwrap()
                .and_hms_opt(9, 5, 7)
                .unwrap(),
        )
    }

    fn frame() -> Frame {
        Frame::from_rgb(RgbImage::from_pixel(8, 6, Rgb([200, 100, 50])))
    }

    #[test]
    fn test_name_from_clock() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::with_clock(dir.path(), clock());

        let artifact = writer.save(&frame()).unwrap();
        assert_eq!(artifact.id, "capture_20261018_090507");
        assert_eq!(artifact.path, dir.path().join("capture_20261018_090507.png"));
        assert!(artifact.path.exists());
    }

    #[test]
    fn test_same_second_gets_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::with_clock(dir.path(), clock());

        let ids: Vec<String> = (0..3).map(|_| writer.save(&frame()).unwrap().id).collect();
        assert_eq!(
            ids,
            vec![
                "capture_20261018_090507",
                "capture_20261018_090507_1",
                "capture_20261018_090507_2",
            ]
        );
    }

    #[test]
    fn test_saved_pixels_are_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::with_clock(dir.path(), clock());

        let bgr = Frame::from_bgr24(1, 1, vec![50, 100, 200]).unwrap();
        let artifact = writer.save(&bgr).unwrap();

        let saved = image::open(&artifact.path).unwrap().to_rgb8();
        assert_eq!(saved.get_pixel(0, 0), &Rgb([200, 100, 50]));
    }

    #[test]
    fn test_gray_frame_saved_as_three_channels() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::with_clock(dir.path(), clock());

        let artifact = writer
            .save(&Frame::from_gray(GrayImage::from_pixel(2, 2, Luma([42]))))
            .unwrap();
        let saved = image::open(&artifact.path).unwrap();
        assert_eq!(saved.color(), image::ColorType::Rgb8);
    }

    // Accepts `room` bytes, then fails like a full disk.
    struct FullDisk {
        room: usize,
        written: Vec<u8>,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written.len() + buf.len() > self.room {
                return Err(io::Error::other("no space left on device"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_on_flush_is_reported() {
        let image = RgbImage::from_pixel(8, 6, Rgb([200, 100, 50]));

        for room in [0, 16] {
            let out = FullDisk {
                room,
                written: Vec::new(),
            };
            assert!(write_png(&image, out).is_err(), "room {room}");
        }
    }

    #[test]
    fn test_write_png_completes() {
        let image = RgbImage::from_pixel(8, 6, Rgb([200, 100, 50]));
        let mut out = FullDisk {
            room: usize::MAX,
            written: Vec::new(),
        };

        write_png(&image, &mut out).unwrap();
        let decoded = image::load_from_memory(&out.written).unwrap().to_rgb8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_unwritable_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::with_clock(dir.path().join("missing/nested"), clock());
        assert!(matches!(
            writer.save(&frame()),
            Err(SnapshotError::Create { .. })
        ));
    }
}
