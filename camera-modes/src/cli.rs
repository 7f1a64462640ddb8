use crate::{
    config::Config,
    dispatch,
    mode::{BLUE_GAIN, ModeParams, ModeRegistry, RED_GAIN},
    selector::{ModeSelector, Selection},
    session::{DisplaySession, SessionOptions, SessionStats},
    snapshot::SnapshotWriter,
    terminal::TerminalPresenter,
};
use anyhow::{Context, Result, bail};
use camera::{CameraConfig, CameraSource, FrameSource, StillSource};
use clap::{Args, Parser, Subcommand};
use std::{fs, path::PathBuf, sync::atomic::Ordering, time::Duration};

#[derive(Parser, Debug)]
#[command(name = "camera-modes")]
#[command(about = "Camera filters for webcams and still images")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the built-in camera modes
    Modes,

    /// List cameras that can stream
    Cameras,

    /// Run one mode over an image file
    Apply(ApplyArgs),

    /// Run the display loop on a camera or an image file
    Live(LiveArgs),
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Mode name, e.g. "Night Mode"
    #[arg(short, long)]
    pub mode: String,

    /// Image to process
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file (default: capture_<timestamp>.png in the capture directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub red_gain: Option<f32>,

    #[arg(long)]
    pub blue_gain: Option<f32>,
}

#[derive(Args, Debug)]
pub struct LiveArgs {
    /// Mode to start in (default from the config file)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Camera index (default from the config file)
    #[arg(short, long)]
    pub camera: Option<u32>,

    /// Stop after this many frames
    #[arg(short, long)]
    pub frames: Option<u64>,

    /// Loop over an image file instead of a camera
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write every processed frame to this PNG
    #[arg(short, long)]
    pub preview: Option<PathBuf>,
}

pub fn run(cli: Cli, config: &Config) -> Result<()> {
    let registry = ModeRegistry::builtin();

    match cli.command {
        Commands::Modes => list_modes(&registry),
        Commands::Cameras => list_cameras(),
        Commands::Apply(args) => apply_file(&registry, config, args),
        Commands::Live(args) => live(&registry, config, args).map(|_| ()),
    }
}

fn list_modes(registry: &ModeRegistry) -> Result<()> {
    for mode in registry.modes() {
        println!("{:<22} {}", mode.name, mode.description);

        for slider in mode.sliders {
            println!(
                "{:<22}   set {} <{}..{}> (default {})",
                "", slider.key, slider.min, slider.max, slider.default
            );
        }

        for (parameter, value) in mode.device.iter() {
            println!("{:<22}   camera {parameter} = {value}", "");
        }
    }

    Ok(())
}

fn list_cameras() -> Result<()> {
    camera::init();

    let cameras = camera::camera_info::query_available_cameras();
    if cameras.is_empty() {
        println!("no cameras found");
    }

    for info in cameras {
        println!("{}: {} ({})", info.index, info.name, info.description);
    }

    Ok(())
}

fn initial_params(config: &Config, red_gain: Option<f32>, blue_gain: Option<f32>) -> ModeParams {
    ModeParams::new()
        .with(RED_GAIN.key, red_gain.unwrap_or(config.mode.red_gain))
        .with(BLUE_GAIN.key, blue_gain.unwrap_or(config.mode.blue_gain))
}

fn apply_file(registry: &ModeRegistry, config: &Config, args: ApplyArgs) -> Result<()> {
    if !registry.contains(&args.mode) {
        bail!(
            "unknown mode `{}`, run `camera-modes modes` for the list",
            args.mode
        );
    }

    let mut source = StillSource::new(&args.input);
    source.open()?;
    let frame = source.read()?;

    let params = initial_params(config, args.red_gain, args.blue_gain);
    let frame = dispatch::apply(registry, &args.mode, frame, &params)
        .with_context(|| format!("apply {} failed", args.mode))?;

    let path = match args.output {
        Some(path) => {
            frame
                .to_rgb_image()
                .save(&path)
                .with_context(|| format!("save {} failed", path.display()))?;
            path
        }
        None => {
            let dir = config.save_dir();
            fs::create_dir_all(&dir)?;
            SnapshotWriter::new(dir).save(&frame)?.path
        }
    };

    println!("{}", path.display());
    Ok(())
}

fn live(registry: &ModeRegistry, config: &Config, args: LiveArgs) -> Result<SessionStats> {
    let mode = args.mode.as_deref().unwrap_or(&config.mode.default);
    let Some(mode) = registry.get(mode) else {
        bail!("unknown mode `{mode}`, run `camera-modes modes` for the list");
    };

    let selector = ModeSelector::new(Selection {
        mode: mode.name.to_string(),
        params: initial_params(config, None, None),
    });

    let save_dir = config.save_dir();
    fs::create_dir_all(&save_dir)?;

    let mut options =
        SessionOptions::default().with_thumbnail_size(config.capture.thumbnail_size);
    if let Some(frames) = args.frames {
        options = options.with_max_frames(frames);
    }

    let source: Box<dyn FrameSource> = match &args.input {
        Some(path) => {
            if config.camera.fps > 0 {
                options = options
                    .with_frame_interval(Duration::from_secs_f64(1.0 / config.camera.fps as f64));
            }
            Box::new(StillSource::new(path))
        }
        None => {
            camera::init();
            let index = camera::camera_info::query_camera_index(
                args.camera.unwrap_or(config.camera.index),
            )?;
            let camera_config = CameraConfig::default()
                .with_fps(config.camera.fps)
                .with_width(config.camera.width)
                .with_height(config.camera.height);
            Box::new(CameraSource::new(index, camera_config))
        }
    };

    let mut session =
        DisplaySession::new(registry, selector, SnapshotWriter::new(save_dir), options);

    let stop = session.stop_handle();
    ctrlc::set_handler(move || {
        log::info!("interrupted, stopping");
        stop.store(true, Ordering::Relaxed);
    })
    .with_context(|| "install Ctrl-C handler failed")?;

    println!("mode: {}  (type a mode name, `set <param> <value>`, `snap` or `quit`)", mode.name);

    let mut presenter = TerminalPresenter::new(args.preview);
    let stats = session.run(source, &mut presenter)?;

    println!(
        "{} frames shown, {} skipped, {} captures",
        stats.displayed, stats.skipped, stats.snapshots
    );

    Ok(stats)
}
