//! The display loop: pull a frame, run the selected mode, show it, repeat.

use crate::{
    dispatch,
    mode::ModeRegistry,
    selector::{ModeSelector, Selection},
    snapshot::{Artifact, Clock, SnapshotError, SnapshotWriter, SystemClock},
};
use camera::{CameraResult, FrameSource};
use derivative::Derivative;
use derive_setters::Setters;
use image::RgbImage;
use image_effect::Frame;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

/// User actions collected by the presentation layer between frames.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SelectMode(String),
    SetParam { key: String, value: f32 },
    Snapshot,
    Stop,
    Unknown(String),
}

/// The display side of the loop.
pub trait Presenter {
    /// Drains the user actions that arrived since the previous call.
    fn poll(&mut self) -> Vec<Command>;

    /// Displays a processed frame. The frame may be single channel.
    fn show(&mut self, frame: &Frame);

    fn warn(&mut self, message: &str);

    fn error(&mut self, message: &str);

    fn captured(&mut self, artifact: &Artifact, thumbnail: Option<&RgbImage>) {
        _ = (artifact, thumbnail);
    }
}

/// Keeps a frame source open for as long as the guard lives.
///
/// The source is closed when the guard drops, whichever way the loop exits.
pub struct CaptureSession<S: FrameSource> {
    source: S,
}

impl<S: FrameSource> CaptureSession<S> {
    pub fn open(mut source: S) -> CameraResult<Self> {
        source.open()?;
        Ok(Self { source })
    }

    pub fn read(&mut self) -> CameraResult<Frame> {
        self.source.read()
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: FrameSource> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        if let Err(e) = self.source.close() {
            log::warn!("close frame source failed: {e}");
        }
    }
}

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct SessionOptions {
    /// Stop after this many cycles. `None` runs until stopped.
    #[derivative(Default(value = "None"))]
    #[setters[strip_option]]
    pub max_frames: Option<u64>,

    /// Pause between cycles. `None` pulls frames back to back.
    #[derivative(Default(value = "None"))]
    #[setters[strip_option]]
    pub frame_interval: Option<Duration>,

    #[derivative(Default(value = "160"))]
    pub thumbnail_size: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub cycles: u64,
    pub displayed: u64,
    pub skipped: u64,
    pub snapshots: u64,
}

// A cycle that showed nothing; the loop moves on either way.
enum Skipped {
    Warn(String),
    Error(String),
}

pub struct DisplaySession<'a, C: Clock = SystemClock> {
    registry: &'a ModeRegistry,
    selector: ModeSelector,
    snapshots: SnapshotWriter<C>,
    stop: Arc<AtomicBool>,
    options: SessionOptions,
    last_capture: Option<(Artifact, Option<RgbImage>)>,
}

impl<'a, C: Clock> DisplaySession<'a, C> {
    pub fn new(
        registry: &'a ModeRegistry,
        selector: ModeSelector,
        snapshots: SnapshotWriter<C>,
        options: SessionOptions,
    ) -> Self {
        Self {
            registry,
            selector,
            snapshots,
            stop: Arc::new(AtomicBool::new(false)),
            options,
            last_capture: None,
        }
    }

    /// Flag that ends the loop at the start of the next cycle once set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn selector(&self) -> &ModeSelector {
        &self.selector
    }

    /// The most recent capture and its thumbnail, if any was taken.
    pub fn last_capture(&self) -> Option<&(Artifact, Option<RgbImage>)> {
        self.last_capture.as_ref()
    }

    fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Runs the loop until stopped or the frame budget is spent.
    ///
    /// Only a source that cannot be opened is an error. Unavailable frames,
    /// failing effects and failed captures are reported to `presenter` and
    /// the loop carries on with the next cycle.
    pub fn run<S, P>(&mut self, source: S, presenter: &mut P) -> CameraResult<SessionStats>
    where
        S: FrameSource,
        P: Presenter + ?Sized,
    {
        let mut capture = match CaptureSession::open(source) {
            Ok(capture) => capture,
            Err(e) => {
                presenter.error(&format!("camera unavailable: {e}"));
                return Err(e);
            }
        };

        let mut stats = SessionStats::default();
        let mut configured_mode: Option<&'static str> = None;
        let mut snapshot_pending = false;

        loop {
            if self.is_stopped()
                || self
                    .options
                    .max_frames
                    .is_some_and(|max| stats.cycles >= max)
            {
                break;
            }

            for command in presenter.poll() {
                self.handle(command, presenter, &mut snapshot_pending);
            }

            if self.is_stopped() {
                break;
            }

            let selection = self.selector.snapshot();
            self.configure_device(&mut capture, &selection, &mut configured_mode);
            stats.cycles += 1;

            match self.process(&mut capture, &selection) {
                Ok(frame) => {
                    if snapshot_pending {
                        snapshot_pending = false;
                        match self.capture(&frame) {
                            Ok(artifact) => {
                                stats.snapshots += 1;
                                let thumbnail = self
                                    .last_capture
                                    .as_ref()
                                    .and_then(|(_, thumb)| thumb.as_ref());
                                presenter.captured(&artifact, thumbnail);
                            }
                            Err(e) => presenter.error(&format!("save capture failed: {e}")),
                        }
                    }

                    presenter.show(&frame);
                    stats.displayed += 1;
                }
                Err(Skipped::Warn(message)) => {
                    stats.skipped += 1;
                    presenter.warn(&message);
                }
                Err(Skipped::Error(message)) => {
                    stats.skipped += 1;
                    presenter.error(&message);
                }
            }

            if let Some(interval) = self.options.frame_interval {
                thread::sleep(interval);
            }
        }

        log::info!(
            "display loop finished: {} cycles, {} shown, {} skipped, {} captures",
            stats.cycles,
            stats.displayed,
            stats.skipped,
            stats.snapshots
        );

        Ok(stats)
    }

    fn handle<P: Presenter + ?Sized>(
        &mut self,
        command: Command,
        presenter: &mut P,
        snapshot_pending: &mut bool,
    ) {
        match command {
            Command::SelectMode(name) => {
                if !self.registry.contains(&name) {
                    presenter.warn(&format!("unknown mode `{name}`"));
                } else if self.selector.select(self.registry, &name) {
                    log::info!("mode switched to {}", self.selector.mode());
                }
            }
            Command::SetParam { key, value } => {
                log::debug!("{key} = {value}");
                self.selector.set_param(&key, value);
            }
            Command::Snapshot => *snapshot_pending = true,
            Command::Stop => self.stop.store(true, Ordering::Relaxed),
            Command::Unknown(text) => presenter.warn(&format!("unknown command `{text}`")),
        }
    }

    fn configure_device<S: FrameSource>(
        &self,
        capture: &mut CaptureSession<S>,
        selection: &Selection,
        configured_mode: &mut Option<&'static str>,
    ) {
        let Some(mode) = self.registry.get(&selection.mode) else {
            return;
        };

        if *configured_mode == Some(mode.name) {
            return;
        }

        if !mode.device.is_empty() {
            let applied = camera::configure(capture.source_mut(), &mode.device);
            log::info!("{}: {applied} camera parameter(s) applied", mode.name);
        }

        *configured_mode = Some(mode.name);
    }

    fn process<S: FrameSource>(
        &self,
        capture: &mut CaptureSession<S>,
        selection: &Selection,
    ) -> Result<Frame, Skipped> {
        let frame = capture.read().map_err(|e| {
            if e.is_transient() {
                Skipped::Warn(format!("frame unavailable: {e}"))
            } else {
                Skipped::Error(format!("camera read failed: {e}"))
            }
        })?;

        dispatch::apply(self.registry, &selection.mode, frame, &selection.params)
            .map_err(|e| Skipped::Error(format!("{} failed: {e}", selection.mode)))
    }

    fn capture(&mut self, frame: &Frame) -> Result<Artifact, SnapshotError> {
        let artifact = self.snapshots.save(frame)?;

        let thumbnail = match image_effect::thumbnail::thumbnail(frame, self.options.thumbnail_size)
        {
            Ok(thumb) => Some(thumb),
            Err(e) => {
                log::warn!("thumbnail for {} failed: {e}", artifact.id);
                None
            }
        };

        self.last_capture = Some((artifact.clone(), thumbnail));
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camera::{CameraError, CameraParameter};
    use chrono::{NaiveDate, NaiveDateTime};
    use image::{Rgb, RgbImage};
    use std::{cell::RefCell, collections::VecDeque, rc::Rc};

    #[derive(Default)]
    struct DeviceLog {
        opened: bool,
        closed: bool,
        params: Vec<(CameraParameter, i64)>,
    }

    struct ScriptedSource {
        reads: VecDeque<Option<Frame>>,
        broken_reads: usize,
        fail_open: bool,
        device: Rc<RefCell<DeviceLog>>,
    }

    impl ScriptedSource {
        fn new(reads: Vec<Option<Frame>>) -> (Self, Rc<RefCell<DeviceLog>>) {
            let device = Rc::new(RefCell::new(DeviceLog::default()));
            let source = Self {
                reads: reads.into(),
                broken_reads: 0,
                fail_open: false,
                device: device.clone(),
            };
            (source, device)
        }
    }

    impl FrameSource for ScriptedSource {
        fn open(&mut self) -> CameraResult<()> {
            if self.fail_open {
                return Err(CameraError::InitializationError("busy".to_string()));
            }
            self.device.borrow_mut().opened = true;
            Ok(())
        }

        fn read(&mut self) -> CameraResult<Frame> {
            if self.broken_reads > 0 {
                self.broken_reads -= 1;
                return Err(CameraError::StopError("device unplugged".to_string()));
            }

            self.reads
                .pop_front()
                .flatten()
                .ok_or(CameraError::NoFrameAvailable)
        }

        fn close(&mut self) -> CameraResult<()> {
            self.device.borrow_mut().closed = true;
            Ok(())
        }

        fn set_parameter(&mut self, parameter: CameraParameter, value: i64) -> CameraResult<()> {
            self.device.borrow_mut().params.push((parameter, value));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        script: VecDeque<Vec<Command>>,
        shown: Vec<Frame>,
        warnings: Vec<String>,
        errors: Vec<String>,
        captures: Vec<Artifact>,
    }

    impl Presenter for RecordingPresenter {
        fn poll(&mut self) -> Vec<Command> {
            self.script.pop_front().unwrap_or_default()
        }

        fn show(&mut self, frame: &Frame) {
            self.shown.push(frame.clone());
        }

        fn warn(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }

        fn error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }

        fn captured(&mut self, artifact: &Artifact, thumbnail: Option<&RgbImage>) {
            assert!(thumbnail.is_some());
            self.captures.push(artifact.clone());
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2026, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap()
        }
    }

    fn gray_frame() -> Frame {
        Frame::from_rgb(RgbImage::from_pixel(64, 48, Rgb([128, 128, 128])))
    }

    fn session<'a>(
        registry: &'a ModeRegistry,
        dir: &std::path::Path,
        max_frames: u64,
    ) -> DisplaySession<'a, FixedClock> {
        DisplaySession::new(
            registry,
            ModeSelector::default(),
            SnapshotWriter::with_clock(dir, FixedClock),
            SessionOptions::default().with_max_frames(max_frames),
        )
    }

    #[test]
    fn test_unavailable_frames_are_skipped() {
        let registry = ModeRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        let (source, device) = ScriptedSource::new(vec![Some(gray_frame()), None, Some(gray_frame())]);
        let mut presenter = RecordingPresenter::default();

        let stats = session(&registry, dir.path(), 3)
            .run(source, &mut presenter)
            .unwrap();

        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.displayed, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(presenter.warnings.len(), 1);
        assert!(device.borrow().opened && device.borrow().closed);
    }

    #[test]
    fn test_hard_read_errors_are_reported_and_skipped() {
        let registry = ModeRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        let (mut source, device) = ScriptedSource::new(vec![Some(gray_frame())]);
        source.broken_reads = 2;
        let mut presenter = RecordingPresenter::default();

        let stats = session(&registry, dir.path(), 3)
            .run(source, &mut presenter)
            .unwrap();

        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.displayed, 1);
        assert_eq!(presenter.errors.len(), 2);
        assert!(presenter.warnings.is_empty());
        assert!(device.borrow().closed);
    }

    #[test]
    fn test_mode_change_takes_effect_next_frame() {
        let registry = ModeRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        let (source, _) = ScriptedSource::new(vec![Some(gray_frame()); 2]);
        let mut presenter = RecordingPresenter {
            script: VecDeque::from(vec![
                vec![],
                vec![Command::SelectMode("Edge Detection".to_string())],
            ]),
            ..Default::default()
        };

        session(&registry, dir.path(), 2)
            .run(source, &mut presenter)
            .unwrap();

        assert_eq!(presenter.shown[0].channels(), 3);
        assert_eq!(presenter.shown[1].channels(), 1);
    }

    #[test]
    fn test_stop_command_closes_source() {
        let registry = ModeRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        let (source, device) = ScriptedSource::new(vec![Some(gray_frame()); 10]);
        let mut presenter = RecordingPresenter {
            script: VecDeque::from(vec![vec![], vec![Command::Stop]]),
            ..Default::default()
        };

        let mut session = DisplaySession::new(
            &registry,
            ModeSelector::default(),
            SnapshotWriter::with_clock(dir.path(), FixedClock),
            SessionOptions::default(),
        );
        let stats = session.run(source, &mut presenter).unwrap();

        assert_eq!(stats.displayed, 1);
        assert!(device.borrow().closed);
    }

    #[test]
    fn test_stop_flag_set_before_run() {
        let registry = ModeRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        let (source, device) = ScriptedSource::new(vec![Some(gray_frame())]);
        let mut presenter = RecordingPresenter::default();

        let mut session = session(&registry, dir.path(), 5);
        session.stop_handle().store(true, Ordering::Relaxed);
        let stats = session.run(source, &mut presenter).unwrap();

        assert_eq!(stats.cycles, 0);
        assert!(device.borrow().opened && device.borrow().closed);
    }

    #[test]
    fn test_open_failure_is_reported() {
        let registry = ModeRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        let (mut source, device) = ScriptedSource::new(vec![]);
        source.fail_open = true;
        let mut presenter = RecordingPresenter::default();

        let result = session(&registry, dir.path(), 1).run(source, &mut presenter);

        assert!(result.is_err());
        assert_eq!(presenter.errors.len(), 1);
        assert!(!device.borrow().closed);
    }

    #[test]
    fn test_device_configured_once_per_mode_change() {
        let registry = ModeRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        let (source, device) = ScriptedSource::new(vec![Some(gray_frame()); 4]);
        let mut presenter = RecordingPresenter {
            script: VecDeque::from(vec![
                vec![Command::SelectMode("Low Light".to_string())],
                vec![],
                vec![Command::SelectMode("Sepia".to_string())],
                vec![Command::SelectMode("Low Light".to_string())],
            ]),
            ..Default::default()
        };

        session(&registry, dir.path(), 4)
            .run(source, &mut presenter)
            .unwrap();

        let writes = device.borrow().params.len();
        assert_eq!(writes, 8);
        assert!(
            device
                .borrow()
                .params
                .contains(&(CameraParameter::Exposure, -4))
        );
    }

    #[test]
    fn test_snapshot_saves_processed_frame() {
        let registry = ModeRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        let (source, _) = ScriptedSource::new(vec![None, Some(gray_frame()), Some(gray_frame())]);
        let mut presenter = RecordingPresenter {
            script: VecDeque::from(vec![vec![
                Command::SelectMode("Warm Tone".to_string()),
                Command::Snapshot,
            ]]),
            ..Default::default()
        };

        let mut session = session(&registry, dir.path(), 3);
        let stats = session.run(source, &mut presenter).unwrap();

        assert_eq!(stats.snapshots, 1);
        assert_eq!(presenter.captures[0].id, "capture_20260102_030405");

        let saved = image::open(&presenter.captures[0].path).unwrap().to_rgb8();
        assert_eq!(saved.get_pixel(0, 0), &Rgb([255, 128, 0]));

        let (artifact, thumb) = session.last_capture().unwrap();
        assert_eq!(artifact, &presenter.captures[0]);
        assert_eq!(thumb.as_ref().unwrap().dimensions(), (64, 48));
    }

    #[test]
    fn test_failed_snapshot_keeps_running() {
        let registry = ModeRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        let (source, _) = ScriptedSource::new(vec![Some(gray_frame()); 2]);
        let mut presenter = RecordingPresenter {
            script: VecDeque::from(vec![vec![Command::Snapshot]]),
            ..Default::default()
        };

        let mut session = DisplaySession::new(
            &registry,
            ModeSelector::default(),
            SnapshotWriter::with_clock(dir.path().join("gone"), FixedClock),
            SessionOptions::default().with_max_frames(2),
        );
        let stats = session.run(source, &mut presenter).unwrap();

        assert_eq!(stats.displayed, 2);
        assert_eq!(stats.snapshots, 0);
        assert_eq!(presenter.errors.len(), 1);
    }

    #[test]
    fn test_unknown_mode_and_command_warn() {
        let registry = ModeRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        let (source, _) = ScriptedSource::new(vec![Some(gray_frame())]);
        let mut presenter = RecordingPresenter {
            script: VecDeque::from(vec![vec![
                Command::SelectMode("Infrared".to_string()),
                Command::Unknown("zoom 2".to_string()),
            ]]),
            ..Default::default()
        };

        let mut session = session(&registry, dir.path(), 1);
        session.run(source, &mut presenter).unwrap();

        assert_eq!(presenter.warnings.len(), 2);
        assert_eq!(session.selector().mode(), "Default");
        assert_eq!(presenter.shown[0], gray_frame());
    }
}
