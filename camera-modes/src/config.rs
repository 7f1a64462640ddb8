use anyhow::{Context, Result, anyhow, bail};
use derivative::Derivative;
use once_cell::sync::Lazy;
use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

const CARGO_TOML: &str = include_str!("../Cargo.toml");
static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::default()));

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(skip)]
    pub data_dir: PathBuf,

    #[serde(skip)]
    pub is_first_run: bool,

    #[serde(skip)]
    pub app_name: String,

    #[serde(default)]
    pub camera: Camera,

    #[serde(default)]
    pub capture: Capture,

    #[serde(default)]
    pub mode: Mode,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Camera {
    #[derivative(Default(value = "0"))]
    pub index: u32,

    #[derivative(Default(value = "640"))]
    pub width: u32,

    #[derivative(Default(value = "480"))]
    pub height: u32,

    #[derivative(Default(value = "30"))]
    pub fps: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Capture {
    // Empty means `<data dir>/captures`
    pub save_dir: String,

    #[derivative(Default(value = "160"))]
    pub thumbnail_size: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Mode {
    #[derivative(Default(value = "crate::mode::DEFAULT_MODE.to_string()"))]
    pub default: String,

    #[derivative(Default(value = "1.0"))]
    pub red_gain: f32,

    #[derivative(Default(value = "1.0"))]
    pub blue_gain: f32,
}

impl Config {
    pub fn init(&mut self) -> Result<()> {
        let metadata = toml::from_str::<toml::Table>(CARGO_TOML)
            .with_context(|| "parse Cargo.toml failed")?;
        self.app_name = metadata
            .get("package")
            .and_then(|p| p.get("name"))
            .and_then(|n| n.as_str())
            .ok_or_else(|| anyhow!("package name missing from Cargo.toml"))?
            .to_string();

        let app_dirs = AppDirs::new(Some(&self.app_name), true)
            .ok_or_else(|| anyhow!("no application directories on this platform"))?;

        self.init_in(&app_dirs.config_dir, &app_dirs.data_dir)?;
        log::debug!("{:?}", self);
        Ok(())
    }

    /// Resolves paths under the given directories, creating them, and loads
    /// the config file found there.
    pub fn init_in(&mut self, config_dir: &Path, data_dir: &Path) -> Result<()> {
        if self.app_name.is_empty() {
            self.app_name = env!("CARGO_PKG_NAME").to_string();
        }

        self.config_path = config_dir.join(format!("{}.toml", self.app_name));
        self.data_dir = data_dir.to_path_buf();

        fs::create_dir_all(config_dir)?;
        fs::create_dir_all(data_dir)?;

        self.load().with_context(|| "load config file failed")
    }

    fn load(&mut self) -> Result<()> {
        match fs::read_to_string(&self.config_path) {
            Ok(text) => match toml::from_str::<Config>(&text) {
                Ok(mut c) => {
                    c.config_path = self.config_path.clone();
                    c.data_dir = self.data_dir.clone();
                    c.is_first_run = self.is_first_run;
                    c.app_name = self.app_name.clone();
                    *self = c;
                    Ok(())
                }
                Err(e) => {
                    log::warn!("{} is not valid, using defaults: {e}", self.config_path.display());
                    self.is_first_run = true;

                    let mut bak_file = self.config_path.clone().into_os_string();
                    bak_file.push(".bak");
                    _ = fs::copy(&self.config_path, bak_file);

                    self.save()
                }
            },
            Err(_) => {
                self.is_first_run = true;
                self.save()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        match toml::to_string_pretty(self) {
            Ok(text) => Ok(fs::write(&self.config_path, text)
                .with_context(|| "save config failed".to_string())?),
            Err(e) => bail!(format!("convert config to toml format failed. {e:?}")),
        }
    }

    pub fn save_dir(&self) -> PathBuf {
        if self.capture.save_dir.trim().is_empty() {
            self.data_dir.join("captures")
        } else {
            PathBuf::from(&self.capture.save_dir)
        }
    }
}

pub fn init() -> Result<()> {
    CONFIG.lock().unwrap_or_else(PoisonError::into_inner).init()
}

pub fn all() -> Config {
    CONFIG.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_run_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config
            .init_in(&dir.path().join("config"), &dir.path().join("data"))
            .unwrap();

        assert!(config.is_first_run);
        assert!(config.config_path.exists());
        assert_eq!(config.camera.fps, 30);
        assert_eq!(config.mode.default, "Default");
        assert_eq!(config.save_dir(), dir.path().join("data").join("captures"));
    }

    #[test]
    fn test_saved_values_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let (config_dir, data_dir) = (dir.path().join("config"), dir.path().join("data"));

        let mut config = Config::default();
        config.init_in(&config_dir, &data_dir).unwrap();
        config.camera.index = 2;
        config.mode.red_gain = 1.4;
        config.capture.save_dir = "/srv/captures".to_string();
        config.save().unwrap();

        let mut reloaded = Config::default();
        reloaded.init_in(&config_dir, &data_dir).unwrap();
        assert!(!reloaded.is_first_run);
        assert_eq!(reloaded.camera.index, 2);
        assert_eq!(reloaded.mode.red_gain, 1.4);
        assert_eq!(reloaded.save_dir(), PathBuf::from("/srv/captures"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("camera-modes.toml"),
            "[camera]\nwidth = 1280\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.init_in(&config_dir, &dir.path().join("data")).unwrap();
        assert_eq!(config.camera.width, 1280);
        assert_eq!(config.camera.height, 480);
        assert_eq!(config.capture.thumbnail_size, 160);
    }

    #[test]
    fn test_broken_file_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join("camera-modes.toml");
        fs::write(&path, "camera = [not toml").unwrap();

        let mut config = Config::default();
        config.init_in(&config_dir, &dir.path().join("data")).unwrap();

        assert!(config.is_first_run);
        assert_eq!(
            fs::read_to_string(config_dir.join("camera-modes.toml.bak")).unwrap(),
            "camera = [not toml"
        );
        assert!(toml::from_str::<Config>(&fs::read_to_string(&path).unwrap()).is_ok());
    }
}
