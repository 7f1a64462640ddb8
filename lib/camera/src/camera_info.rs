use crate::{CameraError, CameraResult};
use nokhwa::{
    CallbackCamera, query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
};

#[derive(Debug, Clone)]
pub struct CameraInfo {
    pub index: CameraIndex,
    pub name: String,
    pub description: String,
}

/// Cameras that can actually stream. Devices that fail a trial open are left out.
pub fn query_available_cameras() -> Vec<CameraInfo> {
    let cameras = match query(ApiBackend::Auto) {
        Ok(cameras) => cameras,
        Err(e) => {
            log::warn!("query cameras failed: {e}");
            return Vec::new();
        }
    };

    cameras
        .into_iter()
        .filter(|camera| verify_camera(camera.index().clone()))
        .map(|camera| CameraInfo {
            index: camera.index().clone(),
            name: camera.human_name(),
            description: camera.description().to_string(),
        })
        .collect()
}

/// Resolves a camera by its numeric position in the backend's device list.
pub fn query_camera_index(index: u32) -> CameraResult<CameraIndex> {
    let cameras = query(ApiBackend::Auto)?;

    cameras
        .into_iter()
        .map(|camera| camera.index().clone())
        .find(|camera_index| matches!(camera_index, CameraIndex::Index(i) if *i == index))
        .ok_or(CameraError::InvalidCameraIndex(index))
}

fn verify_camera(index: CameraIndex) -> bool {
    let format = RequestedFormat::new::<nokhwa::pixel_format::RgbFormat>(
        RequestedFormatType::AbsoluteHighestFrameRate,
    );

    match CallbackCamera::new(index, format, |_| {}) {
        Ok(mut camera) => match camera.open_stream() {
            Ok(_) => {
                _ = camera.stop_stream();
                true
            }
            Err(_) => false,
        },
        Err(_) => false,
    }
}
