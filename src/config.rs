use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::sensitivity::{SensitivitySettings, DEFAULT_DPI, DEFAULT_SENSITIVITY};

/// Device-local key-value settings. Never synced anywhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default)]
    pub best_reaction_time: Option<u64>,
}

fn default_sensitivity() -> f64 {
    DEFAULT_SENSITIVITY
}

fn default_dpi() -> u32 {
    DEFAULT_DPI
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            dpi: DEFAULT_DPI,
            best_reaction_time: None,
        }
    }
}

pub trait SettingsStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;

    fn load_sensitivity_settings(&self) -> SensitivitySettings {
        let settings = self.load();
        SensitivitySettings {
            sensitivity: settings.sensitivity,
            dpi: settings.dpi,
        }
    }

    fn save_sensitivity_settings(&self, sensitivity: f64, dpi: u32) -> std::io::Result<()> {
        let mut settings = self.load();
        settings.sensitivity = sensitivity;
        settings.dpi = dpi;
        self.save(&settings)
    }

    fn best_reaction_time(&self) -> Option<u64> {
        self.load().best_reaction_time
    }

    fn record_best_reaction_time(&self, millis: u64) -> std::io::Result<()> {
        let mut settings = self.load();
        settings.best_reaction_time = Some(millis);
        self.save(&settings)
    }
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "aimdrill") {
            pd.config_dir().join("settings.json")
        } else {
            PathBuf::from("aimdrill_settings.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(settings) = serde_json::from_slice::<Settings>(&bytes) {
                return settings;
            }
            tracing::warn!("ignoring unreadable settings file {:?}", self.path);
        }
        Settings::default()
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)
    }
}
