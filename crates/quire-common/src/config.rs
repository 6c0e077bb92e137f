use miette::Result;
use quire_editor_core::EditorConfig;
use serde::{Deserialize, Serialize};

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ParseError, QuireError, SerDeError};

/// File name used under the platform config directory.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Engine tunables.
    pub editor: EditorSettings,
    /// Layout assumptions for offline position translation.
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Debounce after an edit containing a line break.
    pub newline_delay_ms: u64,
    /// Debounce after any other edit.
    pub edit_delay_ms: u64,
    pub max_suggestions: usize,
    /// Average glyph width as a fraction of the font size.
    pub char_width_factor: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        let defaults = EditorConfig::default();
        Self {
            newline_delay_ms: defaults.newline_delay.as_millis() as u64,
            edit_delay_ms: defaults.edit_delay.as_millis() as u64,
            max_suggestions: defaults.max_suggestions,
            char_width_factor: defaults.char_width_factor,
        }
    }
}

impl EditorSettings {
    pub fn to_editor_config(&self) -> EditorConfig {
        EditorConfig {
            newline_delay: Duration::from_millis(self.newline_delay_ms),
            edit_delay: Duration::from_millis(self.edit_delay_ms),
            max_suggestions: self.max_suggestions,
            char_width_factor: self.char_width_factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub font_size: f64,
    pub line_height: f64,
    pub content_width: f64,
    /// Use the dark highlight palette.
    pub dark: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            line_height: 24.0,
            content_width: 640.0,
            dark: false,
        }
    }
}

impl Config {
    /// Loads the configuration from the provided loader.
    pub fn load(loader: &impl Loader) -> Result<Self> {
        Ok(loader.load()?)
    }

    /// Saves the configuration using the provided saver.
    pub fn save(&self, saver: &impl Saver) -> Result<()> {
        Ok(saver.save(self)?)
    }

    /// Load `path`, writing defaults there first if it doesn't exist.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let store = FileStore::new(path);
        if store.path().exists() {
            return Self::load(&store);
        }
        let config = Self::default();
        if let Some(parent) = store.path().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                QuireError::io(format!("creating {}", parent.display()), e)
            })?;
        }
        config.save(&store)?;
        tracing::info!(
            target: "quire::config",
            path = %store.path().display(),
            "wrote default config"
        );
        Ok(config)
    }
}

/// `<config dir>/quire/config.toml`
pub fn default_path() -> std::result::Result<PathBuf, QuireError> {
    dirs::config_dir()
        .map(|dir| dir.join("quire").join(CONFIG_FILE))
        .ok_or(QuireError::NoConfigDir)
}

/// The trait for loading configuration data.
pub trait Loader {
    fn load(&self) -> std::result::Result<Config, QuireError>;
}

/// The trait for saving configuration data.
pub trait Saver {
    fn save(&self, config: &Config) -> std::result::Result<(), QuireError>;
}

/// An implementation of [`Loader`] and [`Saver`] that reads and writes a configuration file.
///
/// The format follows the file extension: `.toml` or `.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

enum Format {
    Toml,
    Json,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format(&self) -> std::result::Result<Format, QuireError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Format::Toml),
            Some("json") => Ok(Format::Json),
            _ => Err(QuireError::UnsupportedFormat {
                path: self.path.clone(),
            }),
        }
    }
}

impl Loader for FileStore {
    fn load(&self) -> std::result::Result<Config, QuireError> {
        let format = self.format()?;
        let src = std::fs::read_to_string(&self.path)
            .map_err(|e| QuireError::io(format!("reading {}", self.path.display()), e))?;
        let config = match format {
            Format::Toml => toml::from_str(&src)
                .map_err(|e| ParseError::from_toml(&self.path, src.clone(), &e))?,
            Format::Json => serde_json::from_str(&src)
                .map_err(|e| ParseError::from_json(&self.path, src.clone(), &e))?,
        };
        tracing::debug!(target: "quire::config", path = %self.path.display(), "config loaded");
        Ok(config)
    }
}

impl Saver for FileStore {
    fn save(&self, config: &Config) -> std::result::Result<(), QuireError> {
        let body = match self.format()? {
            Format::Toml => toml::to_string_pretty(config).map_err(SerDeError::from)?,
            Format::Json => serde_json::to_string_pretty(config).map_err(SerDeError::from)?,
        };
        std::fs::write(&self.path, body)
            .map_err(|e| QuireError::io(format!("writing {}", self.path.display()), e))
    }
}
