// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Codec configuration
//!
//! Loaded from `.sklearn-flow.yaml`, or from any `*.toml` file. Every field
//! has a default so a missing file is not an error.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{FlowError, FlowResult};
use crate::flow::FLOW_SCHEMA;

/// Default configuration file name
pub const CONFIG_FILE: &str = ".sklearn-flow.yaml";

/// Settings shared by the encoder, decoder and validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodecConfig {
    /// Schema URI written into produced documents
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Library version recorded in every `SKLEARN` step
    #[serde(default = "default_library_version")]
    pub library_version: String,

    /// Maximum nesting depth of the transform graph
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Reject steps that are neither chain members nor referenced
    #[serde(default)]
    pub strict: bool,
}

fn default_schema() -> String {
    FLOW_SCHEMA.to_string()
}

fn default_library_version() -> String {
    "0.22.1".to_string()
}

fn default_max_depth() -> usize {
    64
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            library_version: default_library_version(),
            max_depth: default_max_depth(),
            strict: false,
        }
    }
}

impl CodecConfig {
    /// Load from file; a missing file yields the defaults
    pub fn load(path: &Path) -> FlowResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| FlowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Self = if is_toml(path) {
            toml::from_str(&content).map_err(|e| FlowError::ConfigError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_yaml::from_str::<Option<Self>>(&content)
                .map_err(|e| FlowError::ConfigError {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
                .unwrap_or_default()
        };

        if config.max_depth == 0 {
            return Err(FlowError::ConfigError {
                path: path.to_path_buf(),
                message: "max_depth must be at least 1".to_string(),
            });
        }

        Ok(config)
    }

    /// Load from a project directory (looks for `.sklearn-flow.yaml`)
    pub fn load_from_dir(dir: &Path) -> FlowResult<Self> {
        Self::load(&dir.join(CONFIG_FILE))
    }

    /// Save to file, as TOML for `*.toml` paths and YAML otherwise
    pub fn save(&self, path: &Path) -> FlowResult<()> {
        let content = if is_toml(path) {
            toml::to_string_pretty(self).map_err(|e| FlowError::Toml {
                message: e.to_string(),
            })?
        } else {
            serde_yaml::to_string(self)?
        };

        std::fs::write(path, content).map_err(|e| FlowError::FileWriteError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CodecConfig::load_from_dir(dir.path()).unwrap();

        assert_eq!(config, CodecConfig::default());
        assert_eq!(config.library_version, "0.22.1");
        assert_eq!(config.max_depth, 64);
        assert!(!config.strict);
    }

    #[test]
    fn test_partial_yaml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "strict: true\nmax_depth: 8\n").unwrap();

        let config = CodecConfig::load_from_dir(dir.path()).unwrap();
        assert!(config.strict);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.schema, FLOW_SCHEMA);
    }

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "").unwrap();

        assert_eq!(
            CodecConfig::load_from_dir(dir.path()).unwrap(),
            CodecConfig::default()
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("codec.toml");

        let config = CodecConfig {
            library_version: "1.3.0".to_string(),
            ..CodecConfig::default()
        };
        config.save(&path).unwrap();

        assert!(std::fs::read_to_string(&path).unwrap().contains("library_version"));
        assert_eq!(CodecConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "strikt: true\n").unwrap();

        let err = CodecConfig::load(&path).unwrap_err();
        assert!(matches!(err, FlowError::ConfigError { .. }));
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "max_depth: 0\n").unwrap();

        assert!(CodecConfig::load(&path).is_err());
    }
}
