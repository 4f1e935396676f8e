// Conversion options, persisted as JSON in the user's config directory

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_DIR: &str = "chart-converter";
const OPTIONS_FILE: &str = "options.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid options file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to get config directory")]
    NoConfigDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Missing fields take their default values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub song_output_path: PathBuf,
    pub psarc_files: Vec<PathBuf>,
    pub psarc_folders: Vec<PathBuf>,
    pub rock_band_folders: Vec<PathBuf>,
    pub convert_psarc: bool,
    pub convert_rock_band: bool,
    pub copy_rock_band_audio: bool,
    /// Re-extract audio even when the song already has it
    pub overwrite_audio: bool,
    /// Convert songs whose output directory already exists
    pub overwrite_data: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            song_output_path: PathBuf::new(),
            psarc_files: Vec::new(),
            psarc_folders: Vec::new(),
            rock_band_folders: Vec::new(),
            convert_psarc: true,
            convert_rock_band: true,
            copy_rock_band_audio: true,
            overwrite_audio: false,
            overwrite_data: true,
        }
    }
}

/// Directory holding the options file
pub fn config_dir() -> ConfigResult<PathBuf> {
    let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join(APP_DIR))
}

pub fn default_options_path() -> ConfigResult<PathBuf> {
    Ok(config_dir()?.join(OPTIONS_FILE))
}

impl ConvertOptions {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load from `path`, falling back to defaults when it is missing or invalid
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match Self::load(path) {
            Ok(options) => options,
            Err(e) => {
                log::warn!("Using default options, failed to load {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Anything to convert at all
    pub fn has_sources(&self) -> bool {
        (self.convert_psarc && !(self.psarc_files.is_empty() && self.psarc_folders.is_empty()))
            || (self.convert_rock_band && !self.rock_band_folders.is_empty())
    }
}
