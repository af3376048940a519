//! Builder configuration
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (purifier-schema.toml)
//! - Environment variables (PURIFIER_SCHEMA__*)
//!
//! ## Example config file (purifier-schema.toml):
//! ```toml
//! [audit]
//! enabled = true
//! level = "warning"
//!
//! [literal]
//! max_depth = 8
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::audit::Severity;
use crate::literal::DEFAULT_MAX_DEPTH;

/// Main configuration for the fragment builder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Unused-key audit settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Literal evaluator settings
    #[serde(default)]
    pub literal: LiteralConfig,
}

/// Unused-key audit configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Run the audit after each successful build
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Severity given to unused-key diagnostics
    #[serde(default)]
    pub level: Severity,
}

/// Literal evaluator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralConfig {
    /// Maximum bracket nesting in ALLOWED / VALUE-ALIASES
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: Severity::Notice,
        }
    }
}

impl Default for LiteralConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl BuilderConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "purifier-schema.toml",
            ".purifier-schema.toml",
            "config/purifier-schema.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("org", "htmlpurifier", "purifier-schema") {
            let xdg_config = config_dir.config_dir().join("purifier-schema.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("PURIFIER_SCHEMA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
