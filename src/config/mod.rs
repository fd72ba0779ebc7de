//! User settings stored as `config.json` under the application directory.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    calendar::{Granularity, Period},
    errors::ConfigError,
    utils::fs::write_atomic,
};

const DEFAULT_DIR_NAME: &str = ".bankviz";
const CONFIG_FILE: &str = "config.json";
/// Overrides the application directory when set.
pub const HOME_ENV: &str = "BANKVIZ_HOME";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub default_granularity: Granularity,
    pub default_count: u32,
    pub statement_delimiter: char,
    pub export_delimiter: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_import: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_categories: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_granularity: Granularity::Month,
            default_count: 1,
            statement_delimiter: ';',
            export_delimiter: ',',
            log_filter: None,
            last_import: None,
            last_categories: None,
        }
    }
}

impl Settings {
    pub fn period(&self) -> Period {
        Period::new(self.default_granularity, self.default_count)
    }

    /// Statement delimiter as a byte; non-ASCII values fall back to `;`.
    pub fn statement_delimiter_byte(&self) -> u8 {
        ascii_byte(self.statement_delimiter).unwrap_or(b';')
    }

    /// Export delimiter as a byte; non-ASCII values fall back to `,`.
    pub fn export_delimiter_byte(&self) -> u8 {
        ascii_byte(self.export_delimiter).unwrap_or(b',')
    }
}

fn ascii_byte(ch: char) -> Option<u8> {
    u8::try_from(ch).ok().filter(u8::is_ascii)
}

/// Application directory: `$BANKVIZ_HOME`, else `~/.bankviz`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: impl AsRef<Path>) -> Self {
        Self {
            path: base.as_ref().join(CONFIG_FILE),
        }
    }

    /// Reads the settings; a missing file yields the defaults.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no settings file, using defaults");
            return Ok(Settings::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| ConfigError::Serde(err.to_string()))
    }

    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let json =
            serde_json::to_string_pretty(settings).map_err(|err| ConfigError::Serde(err.to_string()))?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
