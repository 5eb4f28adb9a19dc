//! Configuration for the validator CLI
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (docschema.toml)
//! - Environment variables (DOCSCHEMA__*)
//!
//! ## Example config file (docschema.toml):
//! ```toml
//! [output]
//! format = "pretty"
//! include_checksum = true
//!
//! [input]
//! extensions = ["json"]
//! recursive = true
//!
//! [validation]
//! schema = "schemas/shop.toml"
//! document = "Customer"
//! fail_fast = false
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the validator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Report settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Input discovery settings
    #[serde(default)]
    pub input: InputConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Report format
    #[serde(default)]
    pub format: OutputFormat,

    /// Print the definition checksum in reports
    #[serde(default = "default_true")]
    pub include_checksum: bool,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One line per message
    #[default]
    Text,
    /// Indented JSON
    Pretty,
    /// Single-line JSON
    Compact,
}

/// Input discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// File extensions picked up when walking directories
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Descend into subdirectories
    #[serde(default = "default_true")]
    pub recursive: bool,
}

/// Validation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Definition file to load
    #[serde(default)]
    pub schema: Option<PathBuf>,

    /// Document class inputs are validated against
    #[serde(default)]
    pub document: Option<String>,

    /// Stop at the first invalid input
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_true() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    vec!["json".to_string()]
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            include_checksum: true,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            recursive: true,
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, with `config_path` layered over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["docschema.toml", ".docschema.toml", "config/docschema.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "docschema") {
            let xdg_config = config_dir.config_dir().join("docschema.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // DOCSCHEMA__OUTPUT__FORMAT=compact
        builder = builder.add_source(
            Environment::with_prefix("DOCSCHEMA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Whether `path` has one of the configured input extensions
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.input
                    .extensions
                    .iter()
                    .any(|wanted| wanted.eq_ignore_ascii_case(ext))
            })
    }
}
