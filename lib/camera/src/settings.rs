use crate::{CameraError, FrameSource};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CameraParameter {
    Brightness,
    Contrast,
    Exposure,
    Gain,
}

impl CameraParameter {
    pub fn name(&self) -> &'static str {
        match self {
            CameraParameter::Brightness => "brightness",
            CameraParameter::Contrast => "contrast",
            CameraParameter::Exposure => "exposure",
            CameraParameter::Gain => "gain",
        }
    }

    pub fn all() -> &'static [CameraParameter] {
        &[
            CameraParameter::Brightness,
            CameraParameter::Contrast,
            CameraParameter::Exposure,
            CameraParameter::Gain,
        ]
    }
}

impl fmt::Display for CameraParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CameraParameter {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| CameraError::UnsupportedParameter(s.to_string()))
    }
}

/// Device knobs a camera mode wants set. Parameters not listed keep whatever
/// value the device already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceSettings {
    values: &'static [(CameraParameter, i64)],
}

impl DeviceSettings {
    pub const fn new(values: &'static [(CameraParameter, i64)]) -> Self {
        Self { values }
    }

    pub const fn none() -> Self {
        Self { values: &[] }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, parameter: CameraParameter) -> Option<i64> {
        self.values
            .iter()
            .rev()
            .find(|(p, _)| *p == parameter)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CameraParameter, i64)> + '_ {
        self.values.iter().copied()
    }
}

/// Pushes every parameter in `settings` to `source`, in order.
///
/// A parameter the device refuses is logged and skipped; the rest are still
/// applied. Returns how many parameters were accepted.
pub fn configure<S: FrameSource + ?Sized>(source: &mut S, settings: &DeviceSettings) -> usize {
    let mut applied = 0;

    for (parameter, value) in settings.iter() {
        match source.set_parameter(parameter, value) {
            Ok(_) => {
                log::debug!("set camera {parameter} = {value}");
                applied += 1;
            }
            Err(e) => log::warn!("set camera {parameter} = {value} failed: {e}"),
        }
    }

    applied
}
