//! The fixed table of camera modes.
//!
//! A mode pairs a display name with an optional pipeline of built-in image
//! effects and an optional set of device parameters. The table is built once
//! and only ever read; selecting a mode never mutates it.

use camera::{CameraParameter, DeviceSettings};
use image_effect::{
    ImageEffect,
    blur::GaussianBlurConfig,
    color_map::ColorMap,
    geometry::WidescreenConfig,
    monochrome::{EdgeDetectionConfig, SepiaConfig},
    tone::{ScaleConfig, WhiteBalanceConfig},
};
use std::collections::BTreeMap;

pub const DEFAULT_MODE: &str = "Default";

/// A user-adjustable numeric parameter of a mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slider {
    pub key: &'static str,
    pub label: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub step: f32,
}

impl Slider {
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        value.clamp(self.min, self.max)
    }
}

pub const RED_GAIN: Slider = Slider {
    key: "red_gain",
    label: "Red Gain",
    min: 0.5,
    max: 2.0,
    default: 1.0,
    step: 0.01,
};

pub const BLUE_GAIN: Slider = Slider {
    key: "blue_gain",
    label: "Blue Gain",
    min: 0.5,
    max: 2.0,
    default: 1.0,
    step: 0.01,
};

/// Slider values chosen by the user, keyed by [`Slider::key`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModeParams {
    values: BTreeMap<String, f32>,
}

impl ModeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: f32) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: f32) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    /// The slider's value, defaulted when unset and clamped to its bounds.
    pub fn resolve(&self, slider: &Slider) -> f32 {
        self.get(slider.key)
            .map(|v| slider.clamp(v))
            .unwrap_or(slider.default)
    }
}

/// Builds the effect pipeline for a mode from the current slider values.
pub type TransformFn = fn(&ModeParams) -> Vec<ImageEffect>;

#[derive(Debug, Clone, Copy)]
pub struct Mode {
    pub name: &'static str,
    pub description: &'static str,
    pub transform: Option<TransformFn>,
    pub device: DeviceSettings,
    pub sliders: &'static [Slider],
}

impl Mode {
    /// Effects to run for this mode. Empty means identity.
    pub fn effects(&self, params: &ModeParams) -> Vec<ImageEffect> {
        self.transform.map(|build| build(params)).unwrap_or_default()
    }

    pub fn changes_geometry(&self) -> bool {
        self.effects(&ModeParams::new())
            .iter()
            .any(|e| matches!(e, ImageEffect::Widescreen(_)))
    }
}

/// Ordered, immutable lookup from mode name to [`Mode`].
#[derive(Debug, Clone)]
pub struct ModeRegistry {
    modes: Vec<Mode>,
    aliases: Vec<(&'static str, &'static str)>,
}

impl ModeRegistry {
    pub fn new(modes: Vec<Mode>, aliases: Vec<(&'static str, &'static str)>) -> Self {
        Self { modes, aliases }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_modes(), vec![("Auto", DEFAULT_MODE), ("Normal", DEFAULT_MODE)])
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.modes.iter().map(|m| m.name)
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Finds a mode by display name or alias. Matching ignores ASCII case and
    /// surrounding whitespace.
    pub fn get(&self, name: &str) -> Option<&Mode> {
        let name = name.trim();
        let canonical = self
            .aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
            .map(|(_, target)| *target)
            .unwrap_or(name);

        self.modes
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(canonical))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn scale(alpha: f32, beta: f32) -> ImageEffect {
    ImageEffect::Scale(ScaleConfig::new().with_alpha(alpha).with_beta(beta))
}

fn blur(kernel_size: u32, sigma: f32) -> ImageEffect {
    ImageEffect::GaussianBlur(
        GaussianBlurConfig::new()
            .with_kernel_size(kernel_size)
            .with_sigma(sigma),
    )
}

fn builtin_modes() -> Vec<Mode> {
    vec![
        Mode {
            name: DEFAULT_MODE,
            description: "Unprocessed camera feed",
            transform: None,
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Landscape",
            description: "Brighter, punchier colors",
            transform: Some(|_| vec![scale(1.2, 20.0)]),
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Milky Way",
            description: "Equalized monochrome that pulls detail out of dark skies",
            transform: Some(|_| {
                vec![
                    ImageEffect::Grayscale,
                    ImageEffect::EqualizeHistogram,
                    ImageEffect::ExpandToColor,
                ]
            }),
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Moon Shot",
            description: "Strong gain and lift for small bright subjects",
            transform: Some(|_| vec![scale(1.5, 30.0)]),
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Night Mode",
            description: "Light denoise followed by a brightness boost",
            transform: Some(|_| vec![blur(3, 0.0), scale(1.3, 15.0)]),
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Daylight",
            description: "Gentle brightness lift",
            transform: Some(|_| vec![scale(1.1, 10.0)]),
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Portrait",
            description: "Soft-focus blur",
            transform: Some(|_| vec![blur(11, 10.0)]),
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Manual White Balance",
            description: "Adjustable red and blue channel gains",
            transform: Some(|params| {
                vec![ImageEffect::WhiteBalance(
                    WhiteBalanceConfig::new()
                        .with_red_gain(params.resolve(&RED_GAIN))
                        .with_blue_gain(params.resolve(&BLUE_GAIN)),
                )]
            }),
            device: DeviceSettings::none(),
            sliders: &[RED_GAIN, BLUE_GAIN],
        },
        Mode {
            name: "Vintage",
            description: "Pink-toned faded print",
            transform: Some(|_| {
                vec![
                    ImageEffect::SwapRedBlue,
                    ImageEffect::ColorMap(ColorMap::Pink),
                ]
            }),
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Black & White",
            description: "Luma-only monochrome",
            transform: Some(|_| vec![ImageEffect::Grayscale, ImageEffect::ExpandToColor]),
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Cool Tone",
            description: "Ocean color map",
            transform: Some(|_| vec![ImageEffect::ColorMap(ColorMap::Ocean)]),
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Warm Tone",
            description: "Autumn color map",
            transform: Some(|_| vec![ImageEffect::ColorMap(ColorMap::Autumn)]),
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Sepia",
            description: "Brown-toned monochrome",
            transform: Some(|_| vec![ImageEffect::Sepia(SepiaConfig::new())]),
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Edge Detection",
            description: "Canny edge map, single channel",
            transform: Some(|_| vec![ImageEffect::EdgeDetection(EdgeDetectionConfig::new())]),
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Widescreen",
            description: "Center crop to 16:9",
            transform: Some(|_| vec![ImageEffect::Widescreen(WidescreenConfig::new())]),
            device: DeviceSettings::none(),
            sliders: &[],
        },
        Mode {
            name: "Low Light",
            description: "Raises camera brightness, contrast and gain; frames pass through",
            transform: None,
            device: DeviceSettings::new(&[
                (CameraParameter::Brightness, 160),
                (CameraParameter::Contrast, 140),
                (CameraParameter::Exposure, -4),
                (CameraParameter::Gain, 64),
            ]),
            sliders: &[],
        },
    ]
}
