//! Engine configuration
//!
//! Settings are read from TOML. Every key is optional; missing keys take
//! the values of the embedded default configuration.
//!
//! ```toml
//! [labels]
//! bullet = "-"
//! date_format = "%d.%m.%Y"
//! disabled = ["image"]
//!
//! [output]
//! html_preview = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::label::{LabelOptions, LabelRegistry, DEFAULT_BULLET, DEFAULT_TABLE_STYLE};
use crate::statics::{DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT};

/// Errors that can occur when loading or parsing configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Default configuration
pub const DEFAULT_CONFIG: &str = r#"
[labels]
bullet = "•"
date_format = "%Y-%m-%d"
time_format = "%H:%M:%S"
table_style = "Table Grid"
disabled = []

[templates]
directory = "templates"
index = "templates/.index"

[output]
directory = "output"
html_preview = false
"#;

/// Label formatting and selection
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelsConfig {
    /// Glyph prefixed to unordered list items
    pub bullet: String,
    /// strftime format of the `date` label
    pub date_format: String,
    /// strftime format of the `time` label
    pub time_format: String,
    /// Style name of generated tables; empty for none
    pub table_style: String,
    /// Label types left unregistered
    pub disabled: Vec<String>,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            bullet: DEFAULT_BULLET.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            table_style: DEFAULT_TABLE_STYLE.to_string(),
            disabled: Vec::new(),
        }
    }
}

/// Where the template catalog lives
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Directory scanned for templates
    pub directory: PathBuf,
    /// JSON index of name -> template path
    pub index: PathBuf,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("templates"),
            index: PathBuf::from("templates/.index"),
        }
    }
}

/// Where generated documents go
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Also write an HTML rendering next to each document
    pub html_preview: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            html_preview: false,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub labels: LabelsConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the template directory
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates.directory = dir.into();
        self
    }

    /// Set the template index file
    pub fn with_template_index(mut self, index: impl Into<PathBuf>) -> Self {
        self.templates.index = index.into();
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.directory = dir.into();
        self
    }

    /// Set whether HTML previews are written
    pub fn with_html_preview(mut self, enabled: bool) -> Self {
        self.output.html_preview = enabled;
        self
    }

    /// Set the unordered list glyph
    pub fn with_bullet(mut self, bullet: impl Into<String>) -> Self {
        self.labels.bullet = bullet.into();
        self
    }

    /// Leave a label type unregistered
    pub fn with_disabled_label(mut self, label_type: impl Into<String>) -> Self {
        self.labels.disabled.push(label_type.into());
        self
    }

    /// Formatting options handed to labels
    pub fn label_options(&self) -> LabelOptions {
        LabelOptions {
            bullet: self.labels.bullet.clone(),
            table_style: Some(self.labels.table_style.clone()).filter(|s| !s.is_empty()),
        }
    }

    /// Registry of every built-in label not disabled
    pub fn registry(&self) -> LabelRegistry {
        self.labels
            .disabled
            .iter()
            .fold(LabelRegistry::with_defaults(), |registry, label_type| {
                if !registry.contains(label_type) {
                    log::warn!("cannot disable unknown label type '{}'", label_type);
                }
                registry.without(label_type)
            })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_str(DEFAULT_CONFIG).expect("Default config should be valid TOML")
    }
}
