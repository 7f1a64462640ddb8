use camera::{
    CameraConfig, CameraParameter, CameraResult, CameraSource, DeviceSettings, FrameSource,
    camera_info::query_available_cameras, configure,
};
use std::{thread, time::Duration};

fn main() -> CameraResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    camera::init();

    let fps = 25;
    let cameras = query_available_cameras();
    if cameras.is_empty() {
        log::warn!("No working cameras found!");
        return Ok(());
    }

    log::info!(
        "Found {} camera(s), using first camera: {}",
        cameras.len(),
        cameras[0].name
    );

    let config = CameraConfig::default()
        .with_width(640)
        .with_height(480)
        .with_fps(fps);

    let mut source = CameraSource::new(cameras[0].index.clone(), config);
    source.open()?;

    let applied = configure(
        &mut source,
        &DeviceSettings::new(&[(CameraParameter::Brightness, 160), (CameraParameter::Gain, 64)]),
    );
    log::info!("{applied} camera parameter(s) accepted");

    std::fs::create_dir_all("tmp")?;
    let mut frame_count = 0;
    let mut empty_frame_count = 0;

    for _ in 0..100 {
        thread::sleep(Duration::from_millis(1000 / fps as u64));

        match source.read() {
            Ok(frame) => {
                if frame_count % 10 == 0 {
                    log::info!(
                        "Frame #{}: {}x{}",
                        frame_count,
                        frame.width(),
                        frame.height()
                    );

                    frame
                        .to_rgb_image()
                        .save(format!("tmp/camera-{frame_count}.png"))?;
                }
                frame_count += 1;
            }
            Err(e) => {
                empty_frame_count += 1;
                log::warn!("{e}");
            }
        }
    }

    log::info!("Stopping camera...");
    source.close()?;

    log::info!("Captured {frame_count} frames, {empty_frame_count} empty reads");
    Ok(())
}
