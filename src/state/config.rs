//! Configuration management

use crate::speech::{BackendOptions, EngineKind};
use crate::{Result, SpeakpadError};
use ini::Ini;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Persistent settings: speech engine, voice and output device
///
/// Stored as INI at `~/.speakpad.cfg`. The snippet list is not persisted.
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path
    path: PathBuf,
}

impl Config {
    /// Load configuration from `~/.speakpad.cfg`, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if missing
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| SpeakpadError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| SpeakpadError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self { ini, path })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| SpeakpadError::Config(format!("Failed to save config: {}", e)))
    }

    fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SpeakpadError::Config("Could not find home directory".to_string()))?;
        Ok(home.join(".speakpad.cfg"))
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("speech"))
            .set("engine", "auto")
            .set("voice", "")
            .set("espeak_path", "");

        ini.with_section(Some("audio")).set("device", "");

        ini
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// Configured speech engine
    pub fn engine_kind(&self) -> Result<EngineKind> {
        self.get_string("speech", "engine", "auto").parse()
    }

    /// Options passed through to the speech backends
    pub fn backend_options(&self) -> BackendOptions {
        let espeak_path = self.get_string("speech", "espeak_path", "");
        BackendOptions {
            espeak_path: Some(espeak_path).filter(|p| !p.is_empty()),
        }
    }

    /// Saved voice id; empty means the engine default
    pub fn voice(&self) -> String {
        self.get_string("speech", "voice", "")
    }

    pub fn set_voice(&mut self, id: &str) {
        self.set("speech", "voice", id);
    }

    /// Saved output device name; `None` means the system default
    pub fn device(&self) -> Option<String> {
        Some(self.get_string("audio", "device", "")).filter(|d| !d.is_empty())
    }

    pub fn set_device(&mut self, name: &str) {
        self.set("audio", "device", name);
    }
}
